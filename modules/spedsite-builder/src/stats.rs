/// Counters from one site build.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildStats {
    pub districts_seen: u32,
    pub districts_written: u32,
    pub districts_failed: u32,
    pub duplicate_slugs: u32,
    pub contacts_resolved: u32,
    pub contacts_missing: u32,
    pub enrichment_succeeded: u32,
    pub enrichment_parse_failures: u32,
    pub enrichment_service_failures: u32,
    pub files_written: u32,
}

impl BuildStats {
    pub fn enrichment_degraded(&self) -> u32 {
        self.enrichment_parse_failures + self.enrichment_service_failures
    }
}

impl std::fmt::Display for BuildStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Site Build Complete ===")?;
        writeln!(f, "Districts seen:     {}", self.districts_seen)?;
        writeln!(f, "Districts written:  {}", self.districts_written)?;
        writeln!(f, "Districts failed:   {}", self.districts_failed)?;
        if self.duplicate_slugs > 0 {
            writeln!(f, "Duplicate slugs:    {}", self.duplicate_slugs)?;
        }
        writeln!(f, "Files written:      {}", self.files_written)?;
        writeln!(f, "\nContacts:")?;
        writeln!(f, "  Resolved: {}", self.contacts_resolved)?;
        writeln!(f, "  Missing:  {}", self.contacts_missing)?;
        writeln!(f, "\nEnrichment:")?;
        writeln!(f, "  Generated:         {}", self.enrichment_succeeded)?;
        writeln!(f, "  Parse fallbacks:   {}", self.enrichment_parse_failures)?;
        write!(f, "  Service fallbacks: {}", self.enrichment_service_failures)
    }
}
