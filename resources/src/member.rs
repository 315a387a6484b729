use backend::{Authority, ErrorCode, Route};
use std::sync::Arc;
use tempvoice_models::{
    id::{GuildId, UserId},
    member::{GuildMember, GuildMemberPatch, NewGuildMember},
};

use crate::{manager::Resource, ResourceError, ResourceManager};

impl Resource for GuildMember {
    type Key = UserId;
    type Scope = GuildId;
    type Create = NewGuildMember;
    type Patch = GuildMemberPatch;

    const NAME: &'static str = "guild_member";

    fn item_route(guild_id: GuildId, member_id: UserId) -> Route {
        Route::Member {
            guild_id: guild_id.get(),
            member_id: member_id.get(),
        }
    }

    fn collection_route(guild_id: GuildId) -> Route {
        Route::Members {
            guild_id: guild_id.get(),
        }
    }
}

/// The member profiles of one guild
pub struct GuildMemberResourceManager {
    members: ResourceManager<GuildMember>,
}

impl GuildMemberResourceManager {
    pub(crate) fn new(guild_id: GuildId, authority: Arc<dyn Authority>) -> Self {
        Self {
            members: ResourceManager::new(guild_id, authority),
        }
    }

    /// Fetch a profile. With `auto_create`, a profile the authority does not know is created.
    pub async fn fetch(
        &self,
        member_id: UserId,
        auto_create: bool,
    ) -> Result<Arc<GuildMember>, ResourceError> {
        match self.members.get(member_id).await {
            Err(err) if auto_create && err.code() == Some(&ErrorCode::MemberNotFound) => {
                tracing::debug!(member = %member_id, "Creating missing member profile");
                self.create(member_id).await
            }
            res => res,
        }
    }

    pub async fn create(&self, member_id: UserId) -> Result<Arc<GuildMember>, ResourceError> {
        self.members
            .create(member_id, &NewGuildMember { member_id })
            .await
    }

    pub async fn update(
        &self,
        member_id: UserId,
        patch: &GuildMemberPatch,
    ) -> Result<Arc<GuildMember>, ResourceError> {
        self.members.update(member_id, patch).await
    }

    pub async fn delete(&self, member_id: UserId) -> Result<(), ResourceError> {
        self.members.delete(member_id).await
    }
}
