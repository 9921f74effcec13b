use super::models::PermissionSpec;

/// Primary keys 1 to 4 belong to the built-in groups.
pub const GROUP_ANONYMOUS: i64 = 1;
pub const GROUP_REGISTERED: i64 = 2;
pub const GROUP_DELEGATES: i64 = 3;
pub const GROUP_STAFF: i64 = 4;
pub const RESERVED_GROUP_IDS: [i64; 4] =
    [GROUP_ANONYMOUS, GROUP_REGISTERED, GROUP_DELEGATES, GROUP_STAFF];

pub const ANONYMOUS_GROUP_NAME: &str = "Anonymous";
pub const REGISTERED_GROUP_NAME: &str = "Registered";
pub const DELEGATES_GROUP_NAME: &str = "Delegates";
pub const STAFF_GROUP_NAME: &str = "Staff";

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_DEFAULT_PASSWORD: &str = "admin";

const fn perm(
    app_label: &'static str,
    model: &'static str,
    codename: &'static str,
    name: &'static str,
) -> PermissionSpec {
    PermissionSpec {
        app_label,
        model,
        codename,
        name,
    }
}

/// Every permission known to the application, keyed by content type.
pub const PERMISSION_CATALOG: [PermissionSpec; 21] = [
    perm("core", "customslide", "can_manage_projector", "Can manage the projector"),
    perm("core", "customslide", "can_see_projector", "Can see the projector"),
    perm("core", "customslide", "can_see_dashboard", "Can see the dashboard"),
    perm("agenda", "item", "can_see_agenda", "Can see agenda"),
    perm("agenda", "item", "can_manage_agenda", "Can manage agenda"),
    perm("agenda", "item", "can_see_orga_items", "Can see orga items and time scheduling of agenda"),
    perm("agenda", "speaker", "can_be_speaker", "Can put oneself on the list of speakers"),
    perm("motion", "motion", "can_see_motion", "Can see motions"),
    perm("motion", "motion", "can_create_motion", "Can create motions"),
    perm("motion", "motion", "can_support_motion", "Can support motions"),
    perm("motion", "motion", "can_manage_motion", "Can manage motions"),
    perm("assignment", "assignment", "can_see_assignment", "Can see elections"),
    perm("assignment", "assignment", "can_nominate_other", "Can nominate another person"),
    perm("assignment", "assignment", "can_nominate_self", "Can nominate oneself"),
    perm("assignment", "assignment", "can_manage_assignment", "Can manage elections"),
    perm("participant", "user", "can_see_participant", "Can see participants"),
    perm("participant", "user", "can_manage_participant", "Can manage participants"),
    perm("mediafile", "mediafile", "can_see", "Can see the list of files"),
    perm("mediafile", "mediafile", "can_upload", "Can upload files"),
    perm("mediafile", "mediafile", "can_manage", "Can manage files"),
    perm("config", "configstore", "can_manage", "Can manage configuration"),
];

pub const PERM_SEE_ASSIGNMENT: &str = "assignment.can_see_assignment";
pub const PERM_NOMINATE_OTHER: &str = "assignment.can_nominate_other";
pub const PERM_NOMINATE_SELF: &str = "assignment.can_nominate_self";
pub const PERM_MANAGE_ASSIGNMENT: &str = "assignment.can_manage_assignment";
pub const PERM_MANAGE_CONFIG: &str = "config.can_manage";
