//! Role vocabulary for back-office accounts.
//!
//! Every account carries exactly one of four roles. Capability facts that
//! other modules need (who counts as staff, which roles can hold a project
//! assignment, which roles a sub-admin may touch) are answered here so the
//! policy evaluator never re-derives them.

use serde::{Deserialize, Serialize};

/// Declares a closed enum whose wire and storage label is the
/// SCREAMING_SNAKE_CASE variant name. Extra attributes, including extra
/// derives, pass through ahead of the generated ones.
macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// String label for SQL storage.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Parse from the storage label.
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled_enum! {
    /// The closed set of account roles.
    #[derive(PartialOrd, Ord)]
    Role {
        SuperAdmin => "SUPER_ADMIN",
        SubAdmin => "SUB_ADMIN",
        Developer => "DEVELOPER",
        Customer => "CUSTOMER",
    }
}

/// Roles a sub-admin may create, manage, or move accounts between.
pub const SUB_ADMIN_MANAGEABLE: [Role; 2] = [Role::Developer, Role::Customer];

/// Roles that can hold a project assignment.
pub const ASSIGNABLE: [Role; 2] = [Role::SubAdmin, Role::Developer];

impl Role {
    /// Sub-admins and developers.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::SubAdmin | Role::Developer)
    }

    /// Roles allowed into the administrative surface.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::SubAdmin)
    }

    pub fn can_hold_assignment(&self) -> bool {
        ASSIGNABLE.contains(self)
    }

    pub fn is_sub_admin_manageable(&self) -> bool {
        SUB_ADMIN_MANAGEABLE.contains(self)
    }

    /// Roles this role may create accounts for.
    pub fn creatable_roles(&self) -> &'static [Role] {
        match self {
            Role::SuperAdmin => Role::ALL,
            Role::SubAdmin => &SUB_ADMIN_MANAGEABLE,
            Role::Developer | Role::Customer => &[],
        }
    }
}
