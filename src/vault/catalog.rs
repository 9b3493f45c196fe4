//! Read operations the gateway knows how to forward.

use std::collections::HashMap;

use crate::utils::errors::{ErrorKind, GatewayFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParamSpec {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    /// Path under the API root; `{param}` segments are filled in by `resolve`
    pub template: &'static str,
    pub description: &'static str,
    pub query: &'static [QueryParamSpec],
}

const SEARCH: QueryParamSpec = QueryParamSpec {
    name: "search",
    description: "Search terms",
};
const FILTER: QueryParamSpec = QueryParamSpec {
    name: "filter",
    description: "Property filter",
};
const LIMIT: QueryParamSpec = QueryParamSpec {
    name: "limit",
    description: "Maximum number of results",
};
const OFFSET: QueryParamSpec = QueryParamSpec {
    name: "offset",
    description: "Offset for pagination",
};

pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        name: "accounts.list",
        template: "Accounts",
        description: "List accounts",
        query: &[SEARCH, FILTER, LIMIT, OFFSET],
    },
    Endpoint {
        name: "accounts.get",
        template: "Accounts/{id}",
        description: "Account details",
        query: &[],
    },
    Endpoint {
        name: "accounts.activities",
        template: "Accounts/{id}/Activities",
        description: "Account activity log",
        query: &[],
    },
    Endpoint {
        name: "safes.list",
        template: "Safes",
        description: "List safes",
        query: &[SEARCH, LIMIT, OFFSET],
    },
    Endpoint {
        name: "safes.get",
        template: "Safes/{safeName}",
        description: "Safe details",
        query: &[],
    },
    Endpoint {
        name: "safes.members",
        template: "Safes/{safeName}/Members",
        description: "Safe members",
        query: &[],
    },
    Endpoint {
        name: "users.list",
        template: "Users",
        description: "List users",
        query: &[SEARCH, FILTER],
    },
    Endpoint {
        name: "users.get",
        template: "Users/{id}",
        description: "User details",
        query: &[],
    },
    Endpoint {
        name: "groups.list",
        template: "UserGroups",
        description: "List user groups",
        query: &[SEARCH],
    },
    Endpoint {
        name: "groups.members",
        template: "UserGroups/{id}/Members",
        description: "Members of a user group",
        query: &[],
    },
    Endpoint {
        name: "platforms.list",
        template: "Platforms",
        description: "List platforms",
        query: &[],
    },
    Endpoint {
        name: "platforms.get",
        template: "Platforms/{id}",
        description: "Platform details",
        query: &[],
    },
    Endpoint {
        name: "reports.list",
        template: "Reports",
        description: "List reports",
        query: &[],
    },
    Endpoint {
        name: "system.summary",
        template: "SystemHealth/Summary",
        description: "System health summary",
        query: &[],
    },
    Endpoint {
        name: "system.details",
        template: "SystemHealth/Details",
        description: "System health details",
        query: &[QueryParamSpec {
            name: "componentID",
            description: "Component to check",
        }],
    },
];

pub fn find(name: &str) -> Option<&'static Endpoint> {
    ENDPOINTS
        .iter()
        .find(|endpoint| endpoint.name.eq_ignore_ascii_case(name))
}

impl Endpoint {
    /// Names of the `{param}` segments, in order
    pub fn path_params(&self) -> Vec<&'static str> {
        self.template
            .split('/')
            .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
            .collect()
    }

    /// Substitute path parameters and return the logical path segments
    pub fn resolve(&self, args: &HashMap<String, String>) -> Result<Vec<String>, GatewayFailure> {
        let mut missing = Vec::new();
        let mut segments = Vec::new();

        for segment in self.template.split('/') {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(param) => match args.get(param).filter(|value| !value.is_empty()) {
                    Some(value) => segments.push(value.clone()),
                    None => missing.push(param),
                },
                None => segments.push(segment.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(GatewayFailure::new(
                ErrorKind::Validation,
                format!(
                    "Operation '{}' requires path parameter(s): {}",
                    self.name,
                    missing.join(", ")
                ),
            ));
        }

        Ok(segments)
    }

    pub fn query_names(&self) -> String {
        self.query
            .iter()
            .map(|param| param.name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        for (i, endpoint) in ENDPOINTS.iter().enumerate() {
            assert!(
                ENDPOINTS[i + 1..].iter().all(|other| other.name != endpoint.name),
                "duplicate operation {}",
                endpoint.name
            );
        }
    }

    #[test]
    fn test_resolve_substitutes_params() {
        let endpoint = find("safes.members").unwrap();
        assert_eq!(endpoint.path_params(), vec!["safeName"]);

        let args = HashMap::from([("safeName".to_string(), "Finance".to_string())]);
        assert_eq!(
            endpoint.resolve(&args).unwrap(),
            vec!["Safes", "Finance", "Members"]
        );
    }

    #[test]
    fn test_resolve_reports_missing_params() {
        let failure = find("accounts.get")
            .unwrap()
            .resolve(&HashMap::new())
            .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Validation);
        assert!(failure.message.contains("id"));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert!(find("System.Summary").is_some());
        assert!(find("vaults.list").is_none());
        assert_eq!(find("accounts.list").unwrap().query_names(), "search,filter,limit,offset");
    }
}
