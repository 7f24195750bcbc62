//! BDD scenarios for instance create and delete flows.

use rstest_bdd_macros::scenario;

use super::test_helpers::{LifecycleContext, lifecycle_context};

#[scenario(
    path = "tests/features/instance_lifecycle.feature",
    name = "Creation completes on the first ready poll"
)]
fn scenario_create_ready(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/instance_lifecycle.feature",
    name = "Renting more than one instance fails"
)]
fn scenario_rent_count(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/instance_lifecycle.feature",
    name = "Deadline keeps the last observed snapshot"
)]
fn scenario_deadline_snapshot(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}

#[scenario(
    path = "tests/features/instance_lifecycle.feature",
    name = "Deletion completes once the instance disappears"
)]
fn scenario_delete_absent(lifecycle_context: LifecycleContext) {
    let _ = lifecycle_context;
}
