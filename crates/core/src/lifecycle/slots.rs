use serde::{Deserialize, Serialize};

use crate::model::{BookingStatus, Package, Redemption};

/// Display state of one session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// No redemption yet; the session can still be booked.
    Open,
    Scheduled,
    PendingConfirmation,
    Completed,
}

/// One of the `session_count` fixed positions of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSlot<'a> {
    session_number: u32,
    redemption: Option<&'a Redemption>,
}

impl<'a> SessionSlot<'a> {
    /// 1-based position in the package.
    #[must_use]
    pub fn session_number(&self) -> u32 {
        self.session_number
    }

    #[must_use]
    pub fn redemption(&self) -> Option<&'a Redemption> {
        self.redemption
    }

    #[must_use]
    pub fn booking_status(&self) -> Option<BookingStatus> {
        self.redemption.and_then(Redemption::booking_status)
    }

    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.redemption.is_some()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.booking_status().is_some_and(BookingStatus::is_completed)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.booking_status()
            .is_some_and(BookingStatus::is_pending_confirmation)
    }

    #[must_use]
    pub fn state(&self) -> SlotState {
        if !self.is_scheduled() {
            SlotState::Open
        } else if self.is_completed() {
            SlotState::Completed
        } else if self.is_pending() {
            SlotState::PendingConfirmation
        } else {
            SlotState::Scheduled
        }
    }
}

/// How redemptions were matched to slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Slot `i` holds `redemptions[i - 1]`.
    Positional,
    /// Every redemption carried its own slot number.
    Keyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Position or slot number falls outside `1..=session_count`.
    OutOfRange,
    /// Another redemption already claimed the same slot number.
    DuplicateSlot,
    /// Booking snapshot missing or pointing at a different booking.
    UnresolvedBooking,
}

/// A redemption left out of the slot layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IgnoredRedemption<'a> {
    pub redemption: &'a Redemption,
    pub reason: IgnoreReason,
}

/// Exactly `session_count` slots, numbered `1..=session_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSlots<'a> {
    slots: Vec<SessionSlot<'a>>,
    ignored: Vec<IgnoredRedemption<'a>>,
    placement: Placement,
}

impl<'a> SessionSlots<'a> {
    #[must_use]
    pub fn as_slice(&self) -> &[SessionSlot<'a>] {
        &self.slots
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionSlot<'a>> {
        self.slots.iter()
    }

    #[must_use]
    pub fn session_count(&self) -> u32 {
        u32::try_from(self.slots.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn ignored(&self) -> &[IgnoredRedemption<'a>] {
        &self.ignored
    }

    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }
}

/// Lay `redemptions` out over `session_count` slots.
///
/// When every redemption carries an explicit slot number the layout follows
/// those numbers; otherwise list order decides. Redemptions without a
/// resolvable booking, beyond the slot range, or claiming an occupied slot are
/// reported in [`SessionSlots::ignored`] and leave their slot open.
#[must_use]
pub fn normalize(session_count: u32, redemptions: &[Redemption]) -> SessionSlots<'_> {
    let len = usize::try_from(session_count).unwrap_or(usize::MAX);
    let mut placed: Vec<Option<&Redemption>> = vec![None; len];
    let mut ignored = Vec::new();

    let keyed = !redemptions.is_empty() && redemptions.iter().all(|r| r.slot.is_some());

    for (position, redemption) in redemptions.iter().enumerate() {
        let index = if keyed {
            redemption
                .slot
                .and_then(|slot| slot.checked_sub(1))
                .and_then(|slot| usize::try_from(slot).ok())
        } else {
            Some(position)
        };

        let Some(index) = index.filter(|i| *i < len) else {
            ignored.push(IgnoredRedemption {
                redemption,
                reason: IgnoreReason::OutOfRange,
            });
            continue;
        };

        if redemption.resolved_booking().is_none() {
            ignored.push(IgnoredRedemption {
                redemption,
                reason: IgnoreReason::UnresolvedBooking,
            });
            continue;
        }

        if placed[index].is_some() {
            ignored.push(IgnoredRedemption {
                redemption,
                reason: IgnoreReason::DuplicateSlot,
            });
            continue;
        }

        placed[index] = Some(redemption);
    }

    let slots = placed
        .into_iter()
        .zip(1..=session_count)
        .map(|(redemption, session_number)| SessionSlot {
            session_number,
            redemption,
        })
        .collect();

    SessionSlots {
        slots,
        ignored,
        placement: if keyed {
            Placement::Keyed
        } else {
            Placement::Positional
        },
    }
}

/// Session slots for a package.
#[must_use]
pub fn compute_session_slots(package: &Package) -> SessionSlots<'_> {
    normalize(package.session_count(), package.redemptions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::test_support::{draft, package, redemption};
    use crate::model::{BookingId, BookingSnapshot, RedemptionId};
    use crate::time::fixed_now;

    #[test]
    fn produces_one_slot_per_session() {
        for count in [1, 4, 10] {
            let pkg = package(count, &[BookingStatus::Completed]);
            let slots = compute_session_slots(&pkg);
            assert_eq!(slots.as_slice().len(), count as usize);
            let numbers: Vec<u32> = slots.iter().map(SessionSlot::session_number).collect();
            assert_eq!(numbers, (1..=count).collect::<Vec<_>>());
        }
    }

    #[test]
    fn short_redemption_list_leaves_trailing_slots_open() {
        let pkg = package(
            10,
            &[
                BookingStatus::Completed,
                BookingStatus::Scheduled,
                BookingStatus::PendingConfirmation,
            ],
        );
        let slots = compute_session_slots(&pkg);

        assert_eq!(slots.placement(), Placement::Positional);
        assert_eq!(slots.as_slice()[0].state(), SlotState::Completed);
        assert_eq!(slots.as_slice()[1].state(), SlotState::Scheduled);
        assert_eq!(slots.as_slice()[2].state(), SlotState::PendingConfirmation);
        for slot in &slots.as_slice()[3..] {
            assert!(!slot.is_scheduled());
            assert_eq!(slot.state(), SlotState::Open);
            assert!(slot.redemption().is_none());
        }
    }

    #[test]
    fn slot_flags_follow_booking_status() {
        let pkg = package(2, &[BookingStatus::PendingConfirmation]);
        let slots = compute_session_slots(&pkg);
        let first = slots.as_slice()[0];
        assert!(first.is_scheduled());
        assert!(first.is_pending());
        assert!(!first.is_completed());
        assert_eq!(first.redemption(), Some(&pkg.redemptions()[0]));
    }

    #[test]
    fn extra_redemptions_are_ignored() {
        let pkg = package(
            2,
            &[
                BookingStatus::Completed,
                BookingStatus::Completed,
                BookingStatus::Scheduled,
            ],
        );
        let slots = compute_session_slots(&pkg);
        assert_eq!(slots.as_slice().len(), 2);
        assert_eq!(slots.ignored().len(), 1);
        assert_eq!(slots.ignored()[0].reason, IgnoreReason::OutOfRange);
        assert_eq!(slots.ignored()[0].redemption, &pkg.redemptions()[2]);
    }

    #[test]
    fn unresolved_booking_leaves_slot_open() {
        let orphan = Redemption::new(RedemptionId::generate(), BookingId::generate(), fixed_now());
        let pkg = draft(3, vec![redemption(BookingStatus::Completed), orphan])
            .validate()
            .unwrap();
        let slots = compute_session_slots(&pkg);

        assert!(slots.as_slice()[0].is_completed());
        assert!(!slots.as_slice()[1].is_scheduled());
        assert_eq!(slots.ignored()[0].reason, IgnoreReason::UnresolvedBooking);
    }

    #[test]
    fn mismatched_booking_snapshot_is_unresolved() {
        let r = Redemption::new(RedemptionId::generate(), BookingId::generate(), fixed_now())
            .with_booking(BookingSnapshot::new(
                BookingId::generate(),
                BookingStatus::Completed,
                None,
            ));
        let pkg = draft(1, vec![r]).validate().unwrap();
        let slots = compute_session_slots(&pkg);
        assert!(!slots.as_slice()[0].is_completed());
        assert_eq!(slots.ignored().len(), 1);
    }

    #[test]
    fn explicit_slot_numbers_override_list_order() {
        let third = redemption(BookingStatus::Completed).with_slot(3);
        let first = redemption(BookingStatus::Scheduled).with_slot(1);
        let pkg = draft(3, vec![third.clone(), first.clone()])
            .validate()
            .unwrap();
        let slots = compute_session_slots(&pkg);

        assert_eq!(slots.placement(), Placement::Keyed);
        assert_eq!(slots.as_slice()[0].redemption(), Some(&first));
        assert!(!slots.as_slice()[1].is_scheduled());
        assert_eq!(slots.as_slice()[2].redemption(), Some(&third));
    }

    #[test]
    fn keyed_layout_drops_duplicates_and_out_of_range() {
        let a = redemption(BookingStatus::Completed).with_slot(1);
        let dup = redemption(BookingStatus::Scheduled).with_slot(1);
        let zero = redemption(BookingStatus::Scheduled).with_slot(0);
        let high = redemption(BookingStatus::Scheduled).with_slot(9);
        let pkg = draft(2, vec![a.clone(), dup, zero, high]).validate().unwrap();
        let slots = compute_session_slots(&pkg);

        assert_eq!(slots.as_slice()[0].redemption(), Some(&a));
        let reasons: Vec<IgnoreReason> = slots.ignored().iter().map(|i| i.reason).collect();
        assert_eq!(
            reasons,
            vec![
                IgnoreReason::DuplicateSlot,
                IgnoreReason::OutOfRange,
                IgnoreReason::OutOfRange
            ]
        );
    }

    #[test]
    fn partial_slot_numbers_fall_back_to_positions() {
        let keyed = redemption(BookingStatus::Completed).with_slot(2);
        let unkeyed = redemption(BookingStatus::Scheduled);
        let pkg = draft(2, vec![keyed.clone(), unkeyed.clone()])
            .validate()
            .unwrap();
        let slots = compute_session_slots(&pkg);

        assert_eq!(slots.placement(), Placement::Positional);
        assert_eq!(slots.as_slice()[0].redemption(), Some(&keyed));
        assert_eq!(slots.as_slice()[1].redemption(), Some(&unkeyed));
    }
}
