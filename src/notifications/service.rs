//! Notification producers

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::server::metrics;
use crate::user::UserDirectory;

use super::events::{DomainEvent, InvestigationRef};
use super::models::{
    InvestigationSnapshot, NewNotification, Notification, NotificationType, SenderSnapshot,
    SYSTEM_SENDER_NAME,
};
use super::store::NotificationStore;

/// Creates notifications on behalf of the rest of the application.
///
/// Each producer appends exactly one record for one receiver. The sender's
/// display name is looked up when the notification is created and stored with
/// it; later renames don't affect existing notifications.
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    users: Arc<dyn UserDirectory>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    pub fn investigation_created(
        &self,
        investigation: InvestigationRef,
        title: String,
        message: String,
        receiver_id: &str,
        sender_id: &str,
    ) -> Result<Notification> {
        self.create(
            NotificationType::InvestigationCreated,
            title,
            message,
            receiver_id,
            sender_id,
            Some(investigation),
            None,
        )
    }

    pub fn investigation_status_changed(
        &self,
        investigation: InvestigationRef,
        title: String,
        message: String,
        receiver_id: &str,
        sender_id: &str,
    ) -> Result<Notification> {
        self.create(
            NotificationType::InvestigationStatusChanged,
            title,
            message,
            receiver_id,
            sender_id,
            Some(investigation),
            None,
        )
    }

    pub fn comment_added(
        &self,
        investigation: InvestigationRef,
        comment_id: String,
        title: String,
        message: String,
        receiver_id: &str,
        sender_id: &str,
    ) -> Result<Notification> {
        self.create(
            NotificationType::CommentAdded,
            title,
            message,
            receiver_id,
            sender_id,
            Some(investigation),
            Some(comment_id),
        )
    }

    pub fn profile_updated(
        &self,
        title: String,
        message: String,
        receiver_id: &str,
        sender_id: &str,
    ) -> Result<Notification> {
        self.create(
            NotificationType::ProfileUpdated,
            title,
            message,
            receiver_id,
            sender_id,
            None,
            None,
        )
    }

    /// Turns a domain event reported by `actor_id` into a notification.
    /// Returns Ok(None) when the event has nobody to notify.
    pub fn dispatch(&self, event: DomainEvent, actor_id: &str) -> Result<Option<Notification>> {
        let notification = match event {
            DomainEvent::InvestigationCreated {
                investigation,
                establishment_name,
                receiver_id,
            } => self.investigation_created(
                investigation,
                "Nouvelle demande d'investigation".to_string(),
                format!(
                    "Une nouvelle demande d'investigation a été créée pour l'établissement {}",
                    establishment_name
                ),
                &receiver_id,
                actor_id,
            )?,
            DomainEvent::InvestigationStatusChanged {
                investigation,
                status,
                requested_by,
            } => self.investigation_status_changed(
                investigation,
                "Statut de l'investigation mis à jour".to_string(),
                format!("L'investigation est maintenant {}", status.label()),
                &requested_by,
                actor_id,
            )?,
            DomainEvent::CommentAdded {
                investigation,
                comment_id,
                parties,
            } => {
                let receiver_id = match parties.counterpart_of(actor_id) {
                    Some(receiver_id) => receiver_id,
                    None => {
                        debug!(
                            "No counterpart for comment {} on investigation {}",
                            comment_id, investigation.id
                        );
                        return Ok(None);
                    }
                };
                self.comment_added(
                    investigation,
                    comment_id,
                    "Nouveau commentaire".to_string(),
                    "Un nouveau commentaire a été ajouté à l'investigation".to_string(),
                    receiver_id,
                    actor_id,
                )?
            }
            DomainEvent::ProfileUpdated { receiver_id } => self.profile_updated(
                "Profil mis à jour".to_string(),
                "Les informations de votre profil ont été modifiées".to_string(),
                &receiver_id,
                actor_id,
            )?,
        };
        Ok(Some(notification))
    }

    /// Creates one investigation, one status change and one comment
    /// notification for `receiver_id`, to exercise the dashboard.
    pub fn seed_samples(&self, receiver_id: &str) -> Result<Vec<Notification>> {
        let investigation = InvestigationRef {
            id: "sample-investigation-1".to_string(),
            title: "Investigation exemple 1".to_string(),
        };
        let sender_id = "sample-sender";

        Ok(vec![
            self.investigation_created(
                investigation.clone(),
                "Nouvelle investigation exemple".to_string(),
                "Une nouvelle investigation exemple a été créée".to_string(),
                receiver_id,
                sender_id,
            )?,
            self.investigation_status_changed(
                investigation.clone(),
                "Statut mis à jour".to_string(),
                "L'investigation est maintenant en cours".to_string(),
                receiver_id,
                sender_id,
            )?,
            self.comment_added(
                investigation,
                "sample-comment-1".to_string(),
                "Nouveau commentaire".to_string(),
                "Un nouveau commentaire a été ajouté".to_string(),
                receiver_id,
                sender_id,
            )?,
        ])
    }

    fn sender_name(&self, sender_id: &str) -> String {
        match self.users.get_display_name(sender_id) {
            Ok(Some(name)) => name,
            Ok(None) => SYSTEM_SENDER_NAME.to_string(),
            Err(err) => {
                warn!("Failed to resolve sender {}: {}", sender_id, err);
                SYSTEM_SENDER_NAME.to_string()
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create(
        &self,
        notification_type: NotificationType,
        title: String,
        message: String,
        receiver_id: &str,
        sender_id: &str,
        investigation: Option<InvestigationRef>,
        comment_id: Option<String>,
    ) -> Result<Notification> {
        let (investigation_id, investigation) = match investigation {
            Some(InvestigationRef { id, title }) => {
                (Some(id), Some(InvestigationSnapshot { title }))
            }
            None => (None, None),
        };

        let notification = self.store.append(NewNotification {
            notification_type,
            title,
            message,
            receiver_id: receiver_id.to_string(),
            sender_id: sender_id.to_string(),
            investigation_id,
            comment_id,
            sender: SenderSnapshot {
                name: self.sender_name(sender_id),
            },
            investigation,
        })?;
        metrics::record_notification_created(notification_type);
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::events::{InvestigationParties, InvestigationStatus};
    use crate::notifications::models::Page;
    use crate::notifications::SqliteNotificationStore;
    use anyhow::bail;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct FakeDirectory(HashMap<String, String>);

    impl UserDirectory for FakeDirectory {
        fn get_display_name(&self, user_id: &str) -> Result<Option<String>> {
            Ok(self.0.get(user_id).cloned())
        }
    }

    struct BrokenDirectory;

    impl UserDirectory for BrokenDirectory {
        fn get_display_name(&self, _user_id: &str) -> Result<Option<String>> {
            bail!("directory unavailable")
        }
    }

    fn investigation() -> InvestigationRef {
        InvestigationRef {
            id: "inv1".to_string(),
            title: "Contrôle cantine".to_string(),
        }
    }

    fn create_service_with(
        users: Arc<dyn UserDirectory>,
    ) -> (NotificationService, Arc<SqliteNotificationStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store =
            Arc::new(SqliteNotificationStore::new(temp_dir.path().join("notifications.db")).unwrap());
        let service = NotificationService::new(store.clone(), users);
        (service, store, temp_dir)
    }

    fn create_service() -> (NotificationService, Arc<SqliteNotificationStore>, TempDir) {
        let users = FakeDirectory(HashMap::from([
            ("u1".to_string(), "Alice Requérante".to_string()),
            ("u2".to_string(), "Bob Inspecteur".to_string()),
        ]));
        create_service_with(Arc::new(users))
    }

    #[test]
    fn comment_added_snapshots_sender_and_investigation() {
        let (service, store, _temp_dir) = create_service();

        let created = service
            .comment_added(
                investigation(),
                "c1".to_string(),
                "Nouveau commentaire".to_string(),
                "Un nouveau commentaire a été ajouté à l'investigation".to_string(),
                "u1",
                "u2",
            )
            .unwrap();

        assert_eq!(created.notification_type, NotificationType::CommentAdded);
        assert_eq!(created.sender.name, "Bob Inspecteur");
        assert_eq!(created.investigation_id.as_deref(), Some("inv1"));
        assert_eq!(created.comment_id.as_deref(), Some("c1"));
        assert_eq!(
            created.investigation,
            Some(InvestigationSnapshot {
                title: "Contrôle cantine".to_string()
            })
        );
        assert_eq!(store.list_unread_for_user("u1").unwrap(), vec![created]);
    }

    #[test]
    fn profile_updated_has_no_investigation() {
        let (service, _store, _temp_dir) = create_service();

        let created = service
            .profile_updated("Profil".to_string(), "Modifié".to_string(), "u1", "u2")
            .unwrap();

        assert_eq!(created.notification_type, NotificationType::ProfileUpdated);
        assert!(created.investigation_id.is_none());
        assert!(created.investigation.is_none());
        assert!(created.comment_id.is_none());
    }

    #[test]
    fn unknown_sender_falls_back_to_system() {
        let (service, _store, _temp_dir) = create_service();

        let created = service
            .investigation_created(
                investigation(),
                "t".to_string(),
                "m".to_string(),
                "u1",
                "cron-job",
            )
            .unwrap();
        assert_eq!(created.sender.name, SYSTEM_SENDER_NAME);
        assert_eq!(created.sender_id, "cron-job");
    }

    #[test]
    fn directory_failure_falls_back_to_system() {
        let (service, _store, _temp_dir) = create_service_with(Arc::new(BrokenDirectory));

        let created = service
            .profile_updated("t".to_string(), "m".to_string(), "u1", "u2")
            .unwrap();
        assert_eq!(created.sender.name, SYSTEM_SENDER_NAME);
    }

    #[test]
    fn dispatch_comment_notifies_counterpart() {
        let (service, store, _temp_dir) = create_service();
        let parties = InvestigationParties {
            requested_by: "u1".to_string(),
            responded_by: Some("u2".to_string()),
        };

        let from_responder = service
            .dispatch(
                DomainEvent::CommentAdded {
                    investigation: investigation(),
                    comment_id: "c1".to_string(),
                    parties: parties.clone(),
                },
                "u2",
            )
            .unwrap()
            .unwrap();
        assert_eq!(from_responder.receiver_id, "u1");
        assert_eq!(from_responder.sender_id, "u2");
        assert_eq!(from_responder.title, "Nouveau commentaire");

        let from_requester = service
            .dispatch(
                DomainEvent::CommentAdded {
                    investigation: investigation(),
                    comment_id: "c2".to_string(),
                    parties,
                },
                "u1",
            )
            .unwrap()
            .unwrap();
        assert_eq!(from_requester.receiver_id, "u2");
        assert_eq!(from_requester.sender.name, "Alice Requérante");

        assert_eq!(store.count_unread_for_user("u1").unwrap(), 1);
        assert_eq!(store.count_unread_for_user("u2").unwrap(), 1);
    }

    #[test]
    fn dispatch_comment_without_counterpart_creates_nothing() {
        let (service, store, _temp_dir) = create_service();

        let result = service
            .dispatch(
                DomainEvent::CommentAdded {
                    investigation: investigation(),
                    comment_id: "c1".to_string(),
                    parties: InvestigationParties {
                        requested_by: "u1".to_string(),
                        responded_by: None,
                    },
                },
                "u1",
            )
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.list_for_user("u1", Page::default()).unwrap().total, 0);
    }

    #[test]
    fn dispatch_status_change_targets_requester() {
        let (service, _store, _temp_dir) = create_service();

        let created = service
            .dispatch(
                DomainEvent::InvestigationStatusChanged {
                    investigation: investigation(),
                    status: InvestigationStatus::Completed,
                    requested_by: "u1".to_string(),
                },
                "u2",
            )
            .unwrap()
            .unwrap();

        assert_eq!(
            created.notification_type,
            NotificationType::InvestigationStatusChanged
        );
        assert_eq!(created.receiver_id, "u1");
        assert_eq!(created.message, "L'investigation est maintenant terminée");
    }

    #[test]
    fn dispatch_investigation_created_mentions_establishment() {
        let (service, _store, _temp_dir) = create_service();

        let created = service
            .dispatch(
                DomainEvent::InvestigationCreated {
                    investigation: investigation(),
                    establishment_name: "École Jules Ferry".to_string(),
                    receiver_id: "u2".to_string(),
                },
                "u1",
            )
            .unwrap()
            .unwrap();

        assert_eq!(created.receiver_id, "u2");
        assert!(created.message.ends_with("École Jules Ferry"));
    }

    #[test]
    fn seed_samples_creates_three_unread_for_receiver() {
        let (service, store, _temp_dir) = create_service();

        let created = service.seed_samples("u1").unwrap();

        let types: Vec<NotificationType> = created.iter().map(|n| n.notification_type).collect();
        assert_eq!(
            types,
            vec![
                NotificationType::InvestigationCreated,
                NotificationType::InvestigationStatusChanged,
                NotificationType::CommentAdded,
            ]
        );
        assert!(created.iter().all(|n| n.receiver_id == "u1"));
        assert_eq!(store.count_unread_for_user("u1").unwrap(), 3);
    }
}
