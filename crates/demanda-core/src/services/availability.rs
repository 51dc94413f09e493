//! Booking availability checks.
//!
//! Two independent rules, evaluated working-day first because it needs no
//! conflict query and gives the more actionable error for the common
//! wrong-day mistake. A slot is the exact `(member, date, time)` tuple;
//! appointments are point bookings with no duration.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::error::{DemandError, Result};
use crate::services::lifecycle::DemandStore;
use crate::services::member::MemberStore;
use crate::types::{DemandId, MemberId, Weekday};

/// Why a member cannot take a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    /// The member does not work on the requested weekday.
    #[error("member {member_id} does not work on {weekday}")]
    NotWorkingThisDay {
        member_id: MemberId,
        weekday: Weekday,
    },

    /// The member already has a non-terminal demand booked at that slot.
    #[error("member {member_id} already has a booking at {date} {time}")]
    SlotAlreadyBooked {
        member_id: MemberId,
        date: NaiveDate,
        time: NaiveTime,
    },
}

/// Decides whether a member may be booked for a slot.
#[derive(Clone)]
pub struct AvailabilityChecker {
    members: Arc<dyn MemberStore>,
    demands: Arc<dyn DemandStore>,
}

impl AvailabilityChecker {
    /// Create a checker over the member and demand stores.
    pub fn new(members: Arc<dyn MemberStore>, demands: Arc<dyn DemandStore>) -> Self {
        Self { members, demands }
    }

    /// Check that `member_id` may be booked at `(date, time)`.
    ///
    /// `exclude` removes the demand being reassigned from conflict
    /// detection so a demand never conflicts with its own slot.
    ///
    /// This check-then-act sequence is not atomic on its own; the demand
    /// store must re-enforce slot uniqueness inside the assigning
    /// transaction.
    pub async fn check(
        &self,
        member_id: MemberId,
        date: NaiveDate,
        time: NaiveTime,
        exclude: Option<DemandId>,
    ) -> Result<()> {
        let member = self
            .members
            .get(member_id)
            .await?
            .ok_or(DemandError::NotFound("member"))?;

        let weekday = Weekday::of(date);
        if !member.works_on(weekday) {
            return Err(AvailabilityError::NotWorkingThisDay { member_id, weekday }.into());
        }

        if self
            .demands
            .find_slot_conflict(member_id, date, time, exclude)
            .await?
            .is_some()
        {
            return Err(AvailabilityError::SlotAlreadyBooked {
                member_id,
                date,
                time,
            }
            .into());
        }

        Ok(())
    }
}
