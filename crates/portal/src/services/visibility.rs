//! Entity-visibility resolver.
//!
//! Every surface that needs to know "which billing entities can this user
//! touch" asks here; the role rule is never re-derived at call sites.
//! Pure derivation, no side effects.

use pedidoflex_core::{BillingEntity, EntityId, User, UserRole};

/// Where a user lands after sign-in, derived from their visible set.
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// Pick one of these entities as the active context.
    Select(Vec<BillingEntity>),
    /// Non-admin with nothing assigned: no catalog or cart access, the
    /// only available action is sign-out.
    AwaitingActivation,
    /// Admin in a system with no entities yet: go straight to entity
    /// management, there is nothing to pick from.
    ManageEntities,
}

/// The subset of `all` the user may select as active context.
///
/// Admins see the entire collection regardless of their stored ownership
/// list - that list may be stale, and an admin must never be locked out by
/// it. Representatives see exactly the entities they own.
#[must_use]
pub fn visible_entities(user: &User, all: &[BillingEntity]) -> Vec<BillingEntity> {
    match user.role {
        UserRole::Admin => all.to_vec(),
        UserRole::Representative => all
            .iter()
            .filter(|entity| user.entity_ids.contains(&entity.id))
            .cloned()
            .collect(),
    }
}

/// Resolve the user's post-login access state.
#[must_use]
pub fn resolve_access(user: &User, all: &[BillingEntity]) -> Access {
    let visible = visible_entities(user, all);
    if visible.is_empty() {
        return match user.role {
            UserRole::Admin => Access::ManageEntities,
            UserRole::Representative => Access::AwaitingActivation,
        };
    }
    Access::Select(visible)
}

/// Whether the user may run cart and order operations against this entity.
#[must_use]
pub fn can_operate_on(user: &User, entity_id: &EntityId, all: &[BillingEntity]) -> bool {
    visible_entities(user, all)
        .iter()
        .any(|entity| &entity.id == entity_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pedidoflex_core::{Email, TaxId, UserId};

    use super::*;

    fn entity(id: &str) -> BillingEntity {
        BillingEntity {
            id: EntityId::new(id),
            name: format!("Entity {id}"),
            legal_name: None,
            tax_number: TaxId::parse("11.222.333/0001-81").unwrap(),
            responsible_cpf: None,
            distributor: String::new(),
            contact_email: None,
            phone: None,
            address: None,
        }
    }

    fn user(role: UserRole, owned: &[&str]) -> User {
        User {
            id: UserId::new("u1"),
            email: Email::parse("user@pedidoflex.com.br").unwrap(),
            name: "User".to_owned(),
            role,
            entity_ids: owned.iter().map(|id| EntityId::new(*id)).collect(),
        }
    }

    #[test]
    fn test_admin_sees_all_despite_stale_ownership() {
        let all = [entity("c1"), entity("c2"), entity("c3")];
        // The admin's stored list is stale and even references a removed id.
        let admin = user(UserRole::Admin, &["gone"]);

        let visible = visible_entities(&admin, &all);
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn test_representative_sees_only_owned() {
        let all = [entity("c1"), entity("c2"), entity("c3")];
        let rep = user(UserRole::Representative, &["c2", "c3"]);

        let ids: Vec<_> = visible_entities(&rep, &all)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, [EntityId::new("c2"), EntityId::new("c3")]);
    }

    #[test]
    fn test_empty_visible_set_terminal_states() {
        let all = [entity("c1")];
        let rep = user(UserRole::Representative, &[]);
        assert_eq!(resolve_access(&rep, &all), Access::AwaitingActivation);

        let admin = user(UserRole::Admin, &[]);
        assert_eq!(resolve_access(&admin, &[]), Access::ManageEntities);

        // An admin with entities present always gets a picker.
        assert!(matches!(resolve_access(&admin, &all), Access::Select(_)));
    }

    #[test]
    fn test_can_operate_on() {
        let all = [entity("c1"), entity("c2")];
        let rep = user(UserRole::Representative, &["c1"]);

        assert!(can_operate_on(&rep, &EntityId::new("c1"), &all));
        assert!(!can_operate_on(&rep, &EntityId::new("c2"), &all));
        // Owning an id that no longer exists grants nothing.
        let stale = user(UserRole::Representative, &["gone"]);
        assert!(!can_operate_on(&stale, &EntityId::new("gone"), &all));
    }
}
