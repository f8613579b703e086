use serde::{Deserialize, Serialize};

/// Element names the classifier looks for. Built once at startup and shared
/// read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Local name of the optional authorization-query wrapper at the root.
    pub wrapper_element: String,
    /// Local name of the decision request element.
    pub decision_request_element: String,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            wrapper_element: "XACMLAuthzDecisionQuery".to_string(),
            decision_request_element: "Request".to_string(),
        }
    }
}

/// Wrapper attributes that must be present and non-empty.
pub const REQUIRED_WRAPPER_FIELDS: [&str; 3] = ["ID", "IssueInstant", "Version"];
