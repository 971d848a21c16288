//! Registry of the generated cmdlets, one module per service.
use crate::cmdlet::{CmdletSpec, ServiceId};

pub mod chime_messaging;
pub mod cloudwatch;
pub mod greengrass;

/// Every cmdlet, grouped by service.
pub fn all() -> impl Iterator<Item = &'static CmdletSpec> {
    cloudwatch::CMDLETS
        .iter()
        .chain(chime_messaging::CMDLETS)
        .chain(greengrass::CMDLETS)
}

/// Looks a cmdlet up by name, ignoring case.
pub fn find(name: &str) -> Option<&'static CmdletSpec> {
    all().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Cmdlets of one service.
pub fn for_service(service: ServiceId) -> impl Iterator<Item = &'static CmdletSpec> {
    all().filter(move |c| c.service == service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn names_are_unique_and_follow_the_service_prefix() {
        let mut names = HashSet::new();
        for cmdlet in all() {
            assert!(names.insert(cmdlet.name.to_ascii_lowercase()), "duplicate {}", cmdlet.name);
            let noun = cmdlet.name.split_once('-').map(|(_, noun)| noun).unwrap_or_default();
            assert!(noun.starts_with(cmdlet.service.noun_prefix()), "{}", cmdlet.name);
        }
    }

    #[test]
    fn every_service_has_cmdlets() {
        for service in ServiceId::iter() {
            assert!(for_service(service).count() > 0, "{service}");
        }
    }

    #[test]
    fn page_size_parameters_exist_on_their_cmdlet() {
        for cmdlet in all() {
            if let Some(page_size) = cmdlet.pagination.and_then(|p| p.page_size) {
                assert!(cmdlet.parameters.iter().any(|p| p.name == page_size), "{}", cmdlet.name);
            }
        }
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(find("get-cwmetriclist").map(|c| c.operation), Some("ListMetrics"));
        assert!(find("Get-Nothing").is_none());
    }

    #[test]
    fn paginated_cmdlets_write_their_page_items_by_default() {
        assert_eq!(find("Get-GGGroupList").map(|c| c.default_selection()), Some("Groups"));
        assert_eq!(find("Get-CWAlarm").map(|c| c.default_selection()), Some("MetricAlarms"));
        assert_eq!(find("Write-CWMetricData").map(|c| c.default_selection()), Some(""));
        assert_eq!(find("New-GGGroup").map(|c| c.default_selection()), Some("*"));
    }
}
