//! Access decisions for streamable assets.

use crate::principal::Principal;
use crate::resource::ResourceDescriptor;

/// Result of an authorization check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decide whether `principal` may read a video or thumbnail.
///
/// Public resources are open to everyone; private ones only to their owner.
pub fn authorize(principal: Option<&Principal>, resource: &ResourceDescriptor) -> Decision {
    if resource.is_public {
        return Decision::Allow;
    }
    match principal {
        Some(p) if p.id == resource.owner_id => Decision::Allow,
        _ => Decision::Deny,
    }
}

/// Decide whether `principal` may read a profile image.
///
/// Any signed-in caller may view any user's avatar.
pub fn authorize_profile_image(principal: Option<&Principal>) -> Decision {
    if principal.is_some() {
        Decision::Allow
    } else {
        Decision::Deny
    }
}
