//! Material roles the asset collaborator resolves to real materials

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MaterialRole {
    #[default]
    Default,
    /// System of a disabled category under the recolor policy
    DisabledCategory,
    SelectedCursor,
    HoverCursor,
}

impl MaterialRole {
    /// Key the asset collaborator stores the material under
    pub fn key(self) -> &'static str {
        match self {
            MaterialRole::Default => "default",
            MaterialRole::DisabledCategory => "disabled-category",
            MaterialRole::SelectedCursor => "selected-cursor",
            MaterialRole::HoverCursor => "hover-cursor",
        }
    }
}
