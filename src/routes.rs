//! Catalog of every operation the client can dispatch.
//!
//! Each entry is a `pub const` [`Route`] named after the operation, and the
//! same entries are collected into [`CATALOG`] for lookup by name.

use crate::error::{Error, Result};
use crate::route::{Method, Route};

macro_rules! routes {
    ($($name:ident => $method:ident, $template:literal;)*) => {
        $(
            pub const $name: Route = Route::new(Method::$method, $template);
        )*

        /// Every route keyed by its operation name
        pub const CATALOG: &[(&str, Route)] = &[$((stringify!($name), $name)),*];
    };
}

routes! {
    // Gateway
    GATEWAY_GET => Get, "/gateway";
    GATEWAY_BOT_GET => Get, "/gateway/bot";

    // Channels
    CHANNELS_GET => Get, "/channels/{channel}";
    CHANNELS_MODIFY => Patch, "/channels/{channel}";
    CHANNELS_DELETE => Delete, "/channels/{channel}";
    CHANNELS_TYPING => Post, "/channels/{channel}/typing";
    CHANNELS_MESSAGES_LIST => Get, "/channels/{channel}/messages";
    CHANNELS_MESSAGES_GET => Get, "/channels/{channel}/messages/{message}";
    CHANNELS_MESSAGES_CREATE => Post, "/channels/{channel}/messages";
    CHANNELS_MESSAGES_MODIFY => Patch, "/channels/{channel}/messages/{message}";
    CHANNELS_MESSAGES_DELETE => Delete, "/channels/{channel}/messages/{message}";
    CHANNELS_MESSAGES_DELETE_BULK => Post, "/channels/{channel}/messages/bulk_delete";
    CHANNELS_PERMISSIONS_MODIFY => Put, "/channels/{channel}/permissions/{permission}";
    CHANNELS_PERMISSIONS_DELETE => Delete, "/channels/{channel}/permissions/{permission}";
    CHANNELS_INVITES_LIST => Get, "/channels/{channel}/invites";
    CHANNELS_INVITES_CREATE => Post, "/channels/{channel}/invites";
    CHANNELS_PINS_LIST => Get, "/channels/{channel}/pins";
    CHANNELS_PINS_CREATE => Put, "/channels/{channel}/pins/{pin}";
    CHANNELS_PINS_DELETE => Delete, "/channels/{channel}/pins/{pin}";
    CHANNELS_WEBHOOKS_CREATE => Post, "/channels/{channel}/webhooks";
    CHANNELS_WEBHOOKS_LIST => Get, "/channels/{channel}/webhooks";

    // Guilds
    GUILDS_GET => Get, "/guilds/{guild}";
    GUILDS_MODIFY => Patch, "/guilds/{guild}";
    GUILDS_DELETE => Delete, "/guilds/{guild}";
    GUILDS_CHANNELS_LIST => Get, "/guilds/{guild}/channels";
    GUILDS_CHANNELS_CREATE => Post, "/guilds/{guild}/channels";
    GUILDS_CHANNELS_MODIFY => Patch, "/guilds/{guild}/channels";
    GUILDS_MEMBERS_LIST => Get, "/guilds/{guild}/members";
    GUILDS_MEMBERS_GET => Get, "/guilds/{guild}/members/{member}";
    GUILDS_MEMBERS_MODIFY => Patch, "/guilds/{guild}/members/{member}";
    GUILDS_MEMBERS_KICK => Delete, "/guilds/{guild}/members/{member}";
    GUILDS_BANS_LIST => Get, "/guilds/{guild}/bans";
    GUILDS_BANS_CREATE => Put, "/guilds/{guild}/bans/{user}";
    GUILDS_BANS_DELETE => Delete, "/guilds/{guild}/bans/{user}";
    GUILDS_ROLES_LIST => Get, "/guilds/{guild}/roles";
    GUILDS_ROLES_CREATE => Post, "/guilds/{guild}/roles";
    GUILDS_ROLES_MODIFY_BATCH => Patch, "/guilds/{guild}/roles";
    GUILDS_ROLES_MODIFY => Patch, "/guilds/{guild}/roles/{role}";
    GUILDS_ROLES_DELETE => Delete, "/guilds/{guild}/roles/{role}";
    GUILDS_PRUNE_COUNT => Get, "/guilds/{guild}/prune";
    GUILDS_PRUNE_BEGIN => Post, "/guilds/{guild}/prune";
    GUILDS_VOICE_REGIONS_LIST => Get, "/guilds/{guild}/regions";
    GUILDS_INVITES_LIST => Get, "/guilds/{guild}/invites";
    GUILDS_INTEGRATIONS_LIST => Get, "/guilds/{guild}/integrations";
    GUILDS_INTEGRATIONS_CREATE => Post, "/guilds/{guild}/integrations";
    GUILDS_INTEGRATIONS_MODIFY => Patch, "/guilds/{guild}/integrations/{integration}";
    GUILDS_INTEGRATIONS_DELETE => Delete, "/guilds/{guild}/integrations/{integration}";
    GUILDS_INTEGRATIONS_SYNC => Post, "/guilds/{guild}/integrations/{integration}/sync";
    GUILDS_EMBED_GET => Get, "/guilds/{guild}/embed";
    GUILDS_EMBED_MODIFY => Patch, "/guilds/{guild}/embed";
    GUILDS_WEBHOOKS_LIST => Get, "/guilds/{guild}/webhooks";

    // Users
    USERS_ME_GET => Get, "/users/@me";
    USERS_ME_PATCH => Patch, "/users/@me";
    USERS_ME_GUILDS_LIST => Get, "/users/@me/guilds";
    USERS_ME_GUILDS_LEAVE => Delete, "/users/@me/guilds/{guild}";
    USERS_ME_DMS_LIST => Get, "/users/@me/channels";
    USERS_ME_DMS_CREATE => Post, "/users/@me/channels";
    USERS_ME_CONNECTIONS_LIST => Get, "/users/@me/connections";
    USERS_GET => Get, "/users/{user}";

    // Invites
    INVITES_GET => Get, "/invites/{invite}";
    INVITES_DELETE => Delete, "/invites/{invite}";

    // Webhooks
    WEBHOOKS_GET => Get, "/webhooks/{webhook}";
    WEBHOOKS_MODIFY => Patch, "/webhooks/{webhook}";
    WEBHOOKS_DELETE => Delete, "/webhooks/{webhook}";
    WEBHOOKS_TOKEN_GET => Get, "/webhooks/{webhook}/{token}";
    WEBHOOKS_TOKEN_MODIFY => Patch, "/webhooks/{webhook}/{token}";
    WEBHOOKS_TOKEN_DELETE => Delete, "/webhooks/{webhook}/{token}";
    WEBHOOKS_TOKEN_EXECUTE => Post, "/webhooks/{webhook}/{token}";}

/// Find a route by operation name, e.g. `GUILDS_GET`. Case-insensitive.
pub fn lookup(name: &str) -> Result<&'static Route> {
    CATALOG
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, route)| route)
        .ok_or_else(|| Error::UnknownRoute(name.to_string()))
}
