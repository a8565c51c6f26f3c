//! Role claims layer: webservices reachable through the user's enabled
//! global roles, merged into the webservices map with full access.
//!
//! A role grant upgrades to full even where the base layer recorded owner
//! access: role data widens, the narrower base entry is superseded.

use async_trait::async_trait;
use std::sync::Arc;

use crate::claims::generator::ClaimsLayer;
use crate::claims::payload::{AccessClaims, WebserviceAccess};
use crate::error::Result;
use crate::store::{RoleStore, UserProfile};

pub struct RoleClaimsLayer {
    roles: Arc<dyn RoleStore>,
}

impl RoleClaimsLayer {
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self { roles }
    }
}

#[async_trait]
impl ClaimsLayer for RoleClaimsLayer {
    fn name(&self) -> &'static str {
        "role"
    }

    async fn extend(&self, user: &UserProfile, mut claims: AccessClaims) -> Result<AccessClaims> {
        // Super users: the permission layer grants everything wholesale,
        // keep the token small.
        if user.is_super_user {
            return Ok(claims);
        }

        for webservice_id in self.roles.role_webservices(&user.id).await? {
            claims
                .webservices
                .insert(webservice_id, WebserviceAccess::Full);
        }

        Ok(claims)
    }
}
