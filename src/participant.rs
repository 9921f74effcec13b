//! Participant settings, built-in groups and the admin account.

use log::{info, warn};

use crate::database::common::*;
use crate::database::models::{Permission, User};
use crate::database::service::DatabaseService;
use crate::error::Error;
use crate::settings::{ConfigGroup, ConfigGroupedCollection, ConfigVariable, FieldKind, FormField};

/// Receiver for the config signal
pub fn setup_participant_config() -> ConfigGroupedCollection {
    let sort_by_first_name = ConfigVariable::new("participant_sort_users_by_first_name", false)
        .form_field(
            FormField::new(FieldKind::Boolean, "Sort participants by first name")
                .help_text("Disable for sorting by last name"),
        );
    let group_general = ConfigGroup::new("Sorting", vec![sort_by_first_name]);

    let qr_help = "Used for WLAN QRCode in PDF of access data.";
    let group_pdf = ConfigGroup::new(
        "PDF",
        vec![
            ConfigVariable::new("participant_pdf_welcometitle", "Welcome to Plenum!")
                .translatable(true)
                .form_field(FormField::new(
                    FieldKind::Textarea,
                    "Title for access data and welcome PDF",
                )),
            ConfigVariable::new(
                "participant_pdf_welcometext",
                "[Place for your welcome and help text.]",
            )
            .translatable(true)
            .form_field(FormField::new(
                FieldKind::Textarea,
                "Help text for access data and welcome PDF",
            )),
            ConfigVariable::new("participant_pdf_url", "http://example.com:8000").form_field(
                FormField::new(FieldKind::Text, "System URL")
                    .help_text("Used for QRCode in PDF of access data."),
            ),
            ConfigVariable::new("participant_pdf_wlan_ssid", "").form_field(
                FormField::new(FieldKind::Text, "WLAN name (SSID)").help_text(qr_help),
            ),
            ConfigVariable::new("participant_pdf_wlan_password", "").form_field(
                FormField::new(FieldKind::Text, "WLAN password").help_text(qr_help),
            ),
            ConfigVariable::new("participant_pdf_wlan_encryption", "").form_field(
                FormField::new(
                    FieldKind::Choice {
                        choices: vec![
                            ("".into(), "---------".into()),
                            ("WEP".into(), "WEP".into()),
                            ("WPA".into(), "WPA/WPA2".into()),
                            ("nopass".into(), "No encryption".into()),
                        ],
                    },
                    "WLAN encryption",
                )
                .help_text(qr_help),
            ),
        ],
    );

    ConfigGroupedCollection {
        title: "Participant".to_string(),
        url: "participant".to_string(),
        required_permission: PERM_MANAGE_CONFIG.to_string(),
        weight: 50,
        groups: vec![group_general, group_pdf],
    }
}

async fn resolve_permission(
    db: &DatabaseService,
    app_label: &str,
    model: &str,
    codename: &str,
) -> Result<Permission, Error> {
    db.repository()
        .get_permission(app_label, model, codename)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!("Permission {}.{}.{}", app_label, model, codename))
        })
}

/// Receiver for post database setup.
///
/// Creates the groups Anonymous, Registered, Delegates and Staff with the
/// reserved primary keys 1 to 4, then the admin user. Does nothing at all if
/// any of the reserved keys is already taken. Every permission is looked up
/// before the first group is written.
pub async fn create_builtin_groups_and_admin(db: &DatabaseService) -> Result<bool, Error> {
    let repo = db.repository();
    if repo.any_group_exists(&RESERVED_GROUP_IDS).await? {
        info!("Built-in groups already exist, skip seeding");
        return Ok(false);
    }

    // Anonymous and Registered
    let perm_projector = resolve_permission(db, "core", "customslide", "can_see_projector").await?;
    let perm_dashboard = resolve_permission(db, "core", "customslide", "can_see_dashboard").await?;
    let perm_agenda = resolve_permission(db, "agenda", "item", "can_see_agenda").await?;
    let perm_orga_items = resolve_permission(db, "agenda", "item", "can_see_orga_items").await?;
    let can_speak = resolve_permission(db, "agenda", "speaker", "can_be_speaker").await?;
    let perm_motion = resolve_permission(db, "motion", "motion", "can_see_motion").await?;
    let perm_assignment =
        resolve_permission(db, "assignment", "assignment", "can_see_assignment").await?;
    let perm_participant =
        resolve_permission(db, "participant", "user", "can_see_participant").await?;
    let perm_mediafile = resolve_permission(db, "mediafile", "mediafile", "can_see").await?;

    // Delegates
    let create_motion = resolve_permission(db, "motion", "motion", "can_create_motion").await?;
    let support_motion = resolve_permission(db, "motion", "motion", "can_support_motion").await?;
    let nominate_other =
        resolve_permission(db, "assignment", "assignment", "can_nominate_other").await?;
    let nominate_self =
        resolve_permission(db, "assignment", "assignment", "can_nominate_self").await?;
    let upload = resolve_permission(db, "mediafile", "mediafile", "can_upload").await?;

    // Staff
    let manage_agenda = resolve_permission(db, "agenda", "item", "can_manage_agenda").await?;
    let manage_motion = resolve_permission(db, "motion", "motion", "can_manage_motion").await?;
    let manage_assignment =
        resolve_permission(db, "assignment", "assignment", "can_manage_assignment").await?;
    let manage_participant =
        resolve_permission(db, "participant", "user", "can_manage_participant").await?;
    let manage_projector =
        resolve_permission(db, "core", "customslide", "can_manage_projector").await?;
    let manage_mediafile = resolve_permission(db, "mediafile", "mediafile", "can_manage").await?;
    let manage_config = resolve_permission(db, "config", "configstore", "can_manage").await?;

    let see_all = [
        perm_projector.id,
        perm_dashboard.id,
        perm_agenda.id,
        perm_orga_items.id,
        perm_motion.id,
        perm_assignment.id,
        perm_participant.id,
        perm_mediafile.id,
    ];

    let anonymous = repo
        .create_group(Some(GROUP_ANONYMOUS), ANONYMOUS_GROUP_NAME)
        .await?;
    repo.add_group_permissions(anonymous.id, &see_all).await?;

    let registered = repo
        .create_group(Some(GROUP_REGISTERED), REGISTERED_GROUP_NAME)
        .await?;
    let mut registered_perms = see_all.to_vec();
    registered_perms.push(can_speak.id);
    repo.add_group_permissions(registered.id, &registered_perms)
        .await?;

    let delegates = repo
        .create_group(Some(GROUP_DELEGATES), DELEGATES_GROUP_NAME)
        .await?;
    repo.add_group_permissions(
        delegates.id,
        &[
            create_motion.id,
            support_motion.id,
            nominate_other.id,
            nominate_self.id,
            upload.id,
        ],
    )
    .await?;

    let staff = repo.create_group(Some(GROUP_STAFF), STAFF_GROUP_NAME).await?;
    repo.add_group_permissions(
        staff.id,
        &[
            create_motion.id,
            nominate_other.id,
            nominate_self.id,
            upload.id,
            manage_agenda.id,
            manage_motion.id,
            manage_assignment.id,
            manage_participant.id,
            manage_projector.id,
            manage_mediafile.id,
            manage_config.id,
            perm_participant.id,
        ],
    )
    .await?;

    info!("Built-in groups created");
    create_or_reset_admin_user(db).await?;
    Ok(true)
}

/// Get or create the admin user, reset its password to the default and put it into Staff
pub async fn create_or_reset_admin_user(db: &DatabaseService) -> Result<User, Error> {
    let repo = db.repository();
    let mut admin = match repo.get_user_by_username(ADMIN_USERNAME).await? {
        Some(u) => u,
        None => {
            let u = User::new(ADMIN_USERNAME).with_name("", "Administrator");
            repo.create_user(&u).await?
        }
    };
    admin.is_active = true;
    admin.set_password(ADMIN_DEFAULT_PASSWORD)?;
    let admin = repo.update_user(&admin).await?;

    match repo.get_group_by_id(GROUP_STAFF).await? {
        Some(staff) => repo.add_user_to_group(admin.id, staff.id).await?,
        None => warn!("Group Staff doesn't exist, admin has no group"),
    }
    info!("Admin user '{}' reset", admin.username);
    Ok(admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::service::tests::{create_test_service, execute_raw};

    async fn group_perms(db: &DatabaseService, id: i64) -> Vec<String> {
        let mut p = db
            .repository()
            .list_group_permissions(id)
            .await
            .unwrap()
            .iter()
            .map(|p| p.qualified_name())
            .collect::<Vec<_>>();
        p.sort();
        p
    }

    #[tokio::test]
    async fn test_seed_builtin_groups() {
        let (db, _dir) = create_test_service().await;
        assert!(create_builtin_groups_and_admin(&db).await.unwrap());

        let groups = db.repository().list_groups().await.unwrap();
        let names = groups.iter().map(|g| (g.id, g.name.as_str())).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                (1, "Anonymous"),
                (2, "Registered"),
                (3, "Delegates"),
                (4, "Staff")
            ]
        );

        let anonymous = group_perms(&db, GROUP_ANONYMOUS).await;
        assert_eq!(anonymous.len(), 8);
        assert!(anonymous.contains(&"mediafile.can_see".to_string()));
        let registered = group_perms(&db, GROUP_REGISTERED).await;
        assert_eq!(registered.len(), 9);
        assert!(registered.contains(&"agenda.can_be_speaker".to_string()));
        assert_eq!(group_perms(&db, GROUP_DELEGATES).await.len(), 5);
        let staff = group_perms(&db, GROUP_STAFF).await;
        assert_eq!(staff.len(), 12);
        assert!(staff.contains(&"config.can_manage".to_string()));
        assert!(staff.contains(&"participant.can_see_participant".to_string()));

        let admin = db
            .repository()
            .get_user_by_username(ADMIN_USERNAME)
            .await
            .unwrap()
            .unwrap();
        assert!(admin.verify_password(ADMIN_DEFAULT_PASSWORD));
        let admin_groups = db.repository().list_user_groups(admin.id).await.unwrap();
        assert_eq!(admin_groups.len(), 1);
        assert_eq!(admin_groups[0].id, GROUP_STAFF);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let (db, _dir) = create_test_service().await;
        assert!(create_builtin_groups_and_admin(&db).await.unwrap());
        assert!(!create_builtin_groups_and_admin(&db).await.unwrap());
        assert_eq!(db.repository().list_groups().await.unwrap().len(), 4);
        assert_eq!(db.repository().list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_any_reserved_group_skips_everything() {
        let (db, _dir) = create_test_service().await;
        db.repository().create_group(Some(3), "Members").await.unwrap();

        assert!(!create_builtin_groups_and_admin(&db).await.unwrap());
        let groups = db.repository().list_groups().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Members");
        assert!(group_perms(&db, 3).await.is_empty());
        assert!(db.repository().list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_permission_writes_nothing() {
        let (db, dir) = create_test_service().await;
        execute_raw(
            &dir,
            "DELETE FROM auth_permissions WHERE codename = 'can_upload'",
        )
        .await;

        assert!(matches!(
            create_builtin_groups_and_admin(&db).await,
            Err(Error::NotFound(_))
        ));
        assert!(db.repository().list_groups().await.unwrap().is_empty());
        assert!(db
            .repository()
            .get_user_by_username(ADMIN_USERNAME)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_reset_admin_password() {
        let (db, _dir) = create_test_service().await;
        create_builtin_groups_and_admin(&db).await.unwrap();

        let mut admin = db
            .repository()
            .get_user_by_username(ADMIN_USERNAME)
            .await
            .unwrap()
            .unwrap();
        admin.set_password("changed").unwrap();
        admin.is_active = false;
        db.repository().update_user(&admin).await.unwrap();

        let reset = create_or_reset_admin_user(&db).await.unwrap();
        assert_eq!(reset.id, admin.id);
        assert!(reset.is_active);
        assert!(reset.verify_password(ADMIN_DEFAULT_PASSWORD));
        assert_eq!(db.repository().list_user_groups(reset.id).await.unwrap().len(), 1);
    }

    #[test]
    fn test_participant_config_collection() {
        let c = setup_participant_config();
        assert_eq!(c.url, "participant");
        assert_eq!(c.weight, 50);
        let names = c.variables().map(|v| v.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names.len(), 7);
        assert_eq!(names[0], "participant_sort_users_by_first_name");
        assert!(names.contains(&"participant_pdf_wlan_encryption"));
    }
}
