//! Service-level tests for domain_tenancy over the in-memory store

use core_kernel::{DepartmentId, Role, SessionContext, UserId};
use domain_tenancy::{CenterMembership, NewUser, TenancyError};
use test_utils::{assert_tenancy_not_found, assert_tenancy_unauthorized, TestWorld};

// ============================================================================
// Registry administration
// ============================================================================

mod administration_tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let world = TestWorld::new().await;
        world
            .tenancy
            .create_user(&world.registry, NewUser::new("Ada", "ada@uni.edu", Role::Lecturer))
            .await
            .unwrap();

        let result = world
            .tenancy
            .create_user(&world.registry, NewUser::new("Another Ada", "ADA@uni.edu", Role::Coordinator))
            .await;
        assert!(matches!(result, Err(TenancyError::DuplicateName(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_only_registry_administers() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let lecturer = world.lecturer().await;
        let spare = world.coordinator().await;

        for session in [north.coordinator, lecturer] {
            assert_tenancy_unauthorized(
                world
                    .tenancy
                    .create_user(&session, NewUser::new("X", "x@uni.edu", Role::Lecturer))
                    .await,
            );
            assert_tenancy_unauthorized(world.tenancy.create_center(&session, "West", spare.user_id).await);
        }
    }

    #[tokio::test]
    async fn test_invalid_user_data() {
        let world = TestWorld::new().await;
        for (name, email) in [("  ", "a@uni.edu"), ("Ada", "not-an-email")] {
            let result = world
                .tenancy
                .create_user(&world.registry, NewUser::new(name, email, Role::Lecturer))
                .await;
            assert!(matches!(result, Err(TenancyError::InvalidRequest(_))), "{:?}", result);
        }
    }

    #[tokio::test]
    async fn test_center_names_are_unique() {
        let world = TestWorld::new().await;
        world.center("North Campus").await;
        let coordinator = world.coordinator().await;

        let result = world
            .tenancy
            .create_center(&world.registry, "  North   Campus ", coordinator.user_id)
            .await;
        assert!(matches!(result, Err(TenancyError::DuplicateName(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_coordinator_owns_one_center() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;

        let result = world
            .tenancy
            .create_center(&world.registry, "South Campus", north.coordinator.user_id)
            .await;
        assert!(matches!(result, Err(TenancyError::AlreadyAssigned(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_center_requires_a_coordinator() {
        let world = TestWorld::new().await;
        let lecturer = world.lecturer().await;

        let result = world.tenancy.create_center(&world.registry, "East", lecturer.user_id).await;
        assert!(matches!(result, Err(TenancyError::InvalidRequest(_))), "{:?}", result);
        assert_tenancy_not_found(world.tenancy.create_center(&world.registry, "East", UserId::new()).await);
    }

    #[tokio::test]
    async fn test_center_visibility_follows_role() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let south = world.center("South Campus").await;
        let lecturer = world.lecturer_in(&north).await;
        let unassigned = world.lecturer().await;

        assert_eq!(world.tenancy.list_centers(&world.registry).await.unwrap().len(), 2);
        assert_eq!(world.tenancy.list_centers(&north.coordinator).await.unwrap(), vec![north.center.clone()]);
        assert_eq!(world.tenancy.list_centers(&lecturer).await.unwrap(), vec![north.center.clone()]);
        assert!(world.tenancy.list_centers(&unassigned).await.unwrap().is_empty());

        assert!(world.tenancy.get_center(&lecturer, north.center.id).await.is_ok());
        assert_tenancy_not_found(world.tenancy.get_center(&lecturer, south.center.id).await);
        assert_tenancy_not_found(world.tenancy.get_center(&south.coordinator, north.center.id).await);
    }

    #[tokio::test]
    async fn test_reassigning_coordinator_frees_previous_one() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let successor = world.coordinator().await;

        let center = world
            .tenancy
            .assign_coordinator(&world.registry, north.center.id, successor.user_id)
            .await
            .unwrap();
        assert_eq!(center.coordinator_id, successor.user_id);

        let previous = world
            .tenancy
            .find_center_for_coordinator(&world.registry, north.coordinator.user_id)
            .await
            .unwrap();
        assert_eq!(previous, CenterMembership::Unassigned);
    }
}

// ============================================================================
// Lecturer assignment
// ============================================================================

mod assignment_tests {
    use super::*;

    #[tokio::test]
    async fn test_lecturer_binds_once() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let south = world.center("South Campus").await;
        let lecturer = world.lecturer_in(&north).await;

        for (coordinator, center_id) in [
            (north.coordinator, north.center.id),
            (south.coordinator, south.center.id),
        ] {
            let result = world
                .tenancy
                .assign_lecturer_to_center(&coordinator, lecturer.user_id, center_id)
                .await;
            assert!(matches!(result, Err(TenancyError::AlreadyAssigned(_))), "{:?}", result);
        }

        let membership = world
            .tenancy
            .find_center_for_lecturer(&lecturer, lecturer.user_id)
            .await
            .unwrap();
        assert_eq!(membership.center(), Some(&north.center));
    }

    #[tokio::test]
    async fn test_coordinator_cannot_assign_into_foreign_center() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let south = world.center("South Campus").await;
        let lecturer = world.lecturer().await;

        assert_tenancy_not_found(
            world
                .tenancy
                .assign_lecturer_to_center(&south.coordinator, lecturer.user_id, north.center.id)
                .await,
        );
        assert_tenancy_unauthorized(
            world
                .tenancy
                .assign_lecturer_to_center(&lecturer, lecturer.user_id, north.center.id)
                .await,
        );
    }

    #[tokio::test]
    async fn test_unassigned_lecturer_reports_unassigned() {
        let world = TestWorld::new().await;
        let lecturer = world.lecturer().await;

        let membership = world
            .tenancy
            .find_center_for_lecturer(&world.registry, lecturer.user_id)
            .await
            .unwrap();
        assert_eq!(membership, CenterMembership::Unassigned);

        let unassigned = world.tenancy.list_unassigned_lecturers(&world.registry).await.unwrap();
        assert!(unassigned.iter().any(|u| u.id == lecturer.user_id));
    }

    #[tokio::test]
    async fn test_unassigning_clears_department_too() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let physics = world.department(&north, "Physics").await;
        let lecturer = world.lecturer_in(&north).await;
        world
            .tenancy
            .assign_lecturer_to_department(&north.coordinator, lecturer.user_id, physics.id)
            .await
            .unwrap();

        let user = world
            .tenancy
            .unassign_lecturer_from_center(&north.coordinator, lecturer.user_id)
            .await
            .unwrap();
        assert!(user.center_id.is_none());
        assert!(user.department_id.is_none());

        let again = world
            .tenancy
            .unassign_lecturer_from_center(&north.coordinator, lecturer.user_id)
            .await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_department_must_belong_to_lecturers_center() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let south = world.center("South Campus").await;
        let chemistry = world.department(&south, "Chemistry").await;
        let lecturer = world.lecturer_in(&north).await;

        assert_tenancy_not_found(
            world
                .tenancy
                .assign_lecturer_to_department(&south.coordinator, lecturer.user_id, chemistry.id)
                .await,
        );
        assert_tenancy_not_found(
            world
                .tenancy
                .assign_lecturer_to_department(&north.coordinator, lecturer.user_id, chemistry.id)
                .await,
        );
    }

    #[tokio::test]
    async fn test_lecturer_views_own_membership_only() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let physics = world.department(&north, "Physics").await;
        let lecturer = world.lecturer_in(&north).await;
        let colleague = world.lecturer_in(&north).await;
        world
            .tenancy
            .assign_lecturer_to_department(&north.coordinator, lecturer.user_id, physics.id)
            .await
            .unwrap();

        let membership = world
            .tenancy
            .find_center_for_lecturer(&lecturer, lecturer.user_id)
            .await
            .unwrap();
        assert_eq!(
            membership,
            CenterMembership::Assigned { center: north.center.clone(), department: Some(physics) }
        );
        assert_tenancy_not_found(world.tenancy.find_center_for_lecturer(&colleague, lecturer.user_id).await);
    }
}

// ============================================================================
// Departments
// ============================================================================

mod department_tests {
    use super::*;

    #[tokio::test]
    async fn test_department_names_unique_per_center() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let south = world.center("South Campus").await;
        world.department(&north, "Physics").await;

        let duplicate = world
            .tenancy
            .create_department(&north.coordinator, north.center.id, "Physics")
            .await;
        assert!(matches!(duplicate, Err(TenancyError::DuplicateName(_))), "{:?}", duplicate);

        // Same name in another center is fine
        world.department(&south, "Physics").await;
    }

    #[tokio::test]
    async fn test_delete_releases_lecturers_without_deleting_them() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let physics = world.department(&north, "Physics").await;
        let lecturers = [world.lecturer_in(&north).await, world.lecturer_in(&north).await];
        for lecturer in &lecturers {
            world
                .tenancy
                .assign_lecturer_to_department(&north.coordinator, lecturer.user_id, physics.id)
                .await
                .unwrap();
        }
        let users_before = world.store.user_count().await;

        let released = world
            .tenancy
            .delete_department(&north.coordinator, physics.id)
            .await
            .unwrap();

        assert_eq!(released, 2);
        assert_eq!(world.store.user_count().await, users_before);
        for lecturer in &lecturers {
            let membership = world
                .tenancy
                .find_center_for_lecturer(&north.coordinator, lecturer.user_id)
                .await
                .unwrap();
            assert_eq!(
                membership,
                CenterMembership::Assigned { center: north.center.clone(), department: None }
            );
        }
        let remaining = world
            .tenancy
            .list_departments(&north.coordinator, north.center.id)
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_delete_scope_and_missing() {
        let world = TestWorld::new().await;
        let north = world.center("North Campus").await;
        let south = world.center("South Campus").await;
        let physics = world.department(&north, "Physics").await;

        assert_tenancy_not_found(world.tenancy.delete_department(&south.coordinator, physics.id).await);
        assert_tenancy_not_found(world.tenancy.delete_department(&north.coordinator, DepartmentId::new()).await);

        let lecturer: SessionContext = world.lecturer_in(&north).await;
        assert_tenancy_unauthorized(world.tenancy.delete_department(&lecturer, physics.id).await);
    }
}
