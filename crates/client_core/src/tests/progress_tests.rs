use super::*;

#[test]
fn default_schedule_opens_at_one_and_ends_at_full() {
    let first = DEFAULT_MILESTONES.first().expect("non-empty");
    let last = DEFAULT_MILESTONES.last().expect("non-empty");
    assert_eq!(*first, Milestone::new(0, 1));
    assert_eq!(*last, Milestone::new(165, 100));
}

#[test]
fn default_schedule_is_strictly_increasing() {
    assert!(schedule_is_valid(DEFAULT_MILESTONES));
}

#[test]
fn schedule_validation_rejects_degenerate_curves() {
    assert!(!schedule_is_valid(&[]));
    assert!(!schedule_is_valid(&[Milestone::new(0, 0)]));
    // Repeated offset.
    assert!(!schedule_is_valid(&[
        Milestone::new(0, 1),
        Milestone::new(0, 2),
    ]));
    // Percent regression.
    assert!(!schedule_is_valid(&[
        Milestone::new(0, 5),
        Milestone::new(10, 5),
    ]));
}

#[test]
fn remaining_seconds_clamps_at_zero() {
    let total = schedule_total(DEFAULT_MILESTONES);
    assert_eq!(total, Duration::from_secs(165));
    assert_eq!(remaining_seconds(total, Duration::from_secs(5)), 160);
    assert_eq!(remaining_seconds(total, Duration::from_secs(165)), 0);
    assert_eq!(remaining_seconds(total, Duration::from_secs(900)), 0);
}

#[test]
fn empty_schedule_has_zero_span() {
    assert_eq!(schedule_total(&[]), Duration::ZERO);
}
