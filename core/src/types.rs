//! Domain types for the Boxoffice reservation engine.
//!
//! This module contains the value objects and entities shared by the storage
//! and orchestration layers: identifiers, the capacity ledger, seats, and
//! bookings with their one-directional status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a show
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShowId(Uuid);

impl ShowId {
    /// Creates a new random `ShowId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ShowId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ShowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a seat
///
/// Ordered so that multi-seat requests can lock seat rows in a fixed
/// ascending order, which gives concurrent overlapping requests a total
/// lock order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatId(Uuid);

impl SeatId {
    /// Creates a new random `SeatId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `SeatId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SeatId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user
///
/// Supplied by the auth subsystem; the engine treats it as opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Value objects
// ============================================================================

/// Monetary amount in cents (avoids floating point)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from dollars with overflow checking
    #[must_use]
    pub const fn checked_from_dollars(dollars: u64) -> Option<Self> {
        match dollars.checked_mul(100) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Pricing tier of a seat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatTier {
    /// Standard seating (back of the house)
    Regular,
    /// Premium seating (middle of the house)
    Premium,
    /// Best seats (front of the house)
    Vip,
}

impl SeatTier {
    /// Canonical storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "REGULAR",
            Self::Premium => "PREMIUM",
            Self::Vip => "VIP",
        }
    }

    /// Parses the canonical storage representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "REGULAR" => Some(Self::Regular),
            "PREMIUM" => Some(Self::Premium),
            "VIP" => Some(Self::Vip),
            _ => None,
        }
    }
}

impl fmt::Display for SeatTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a seat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatStatus {
    /// Free to be held
    Available,
    /// Held by a pending booking
    Locked,
    /// Sold to a confirmed booking
    Booked,
}

impl SeatStatus {
    /// Canonical storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Locked => "LOCKED",
            Self::Booked => "BOOKED",
        }
    }

    /// Parses the canonical storage representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(Self::Available),
            "LOCKED" => Some(Self::Locked),
            "BOOKED" => Some(Self::Booked),
            _ => None,
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a booking
///
/// Transitions are monotonic and one-directional:
/// `Pending` → {`Confirmed`, `Expired`, `Failed`}. No transition leaves a
/// terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Temporary hold awaiting confirmation
    Pending,
    /// Promoted to a permanent sale
    Confirmed,
    /// Hold lapsed and its units were released
    Expired,
    /// Administratively cancelled
    Failed,
}

impl BookingStatus {
    /// Whether this status admits no further transitions
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Expired | Self::Failed)
    }

    /// Canonical storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Expired => "EXPIRED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses the canonical storage representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            "EXPIRED" => Some(Self::Expired),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// The capacity ledger for one show
///
/// Invariant at every committed state:
/// `reserved_units + confirmed_units <= total_units`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowInventory {
    /// Show this ledger belongs to
    pub show_id: ShowId,
    /// Total sellable units
    pub total_units: u32,
    /// Units held by pending bookings
    pub reserved_units: u32,
    /// Units sold to confirmed bookings
    pub confirmed_units: u32,
}

impl ShowInventory {
    /// Units still available for new holds
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.total_units
            .saturating_sub(self.reserved_units)
            .saturating_sub(self.confirmed_units)
    }
}

/// One physical seat of a show
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Unique seat identifier
    pub id: SeatId,
    /// Show this seat belongs to
    pub show_id: ShowId,
    /// Row label, `A` at the front
    pub row: String,
    /// Seat number within the row, starting at 1
    pub number: u32,
    /// Pricing tier
    pub tier: SeatTier,
    /// Price for this seat
    pub price: Money,
    /// Current status
    pub status: SeatStatus,
    /// Owning booking when `Locked` or `Booked`
    pub booking_id: Option<BookingId>,
}

/// A hold or sale recorded in the booking ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier
    pub id: BookingId,
    /// Show the booking is for
    pub show_id: ShowId,
    /// User who requested the hold
    pub user_id: UserId,
    /// Current status
    pub status: BookingStatus,
    /// Number of units held or sold
    pub units: u32,
    /// Hold deadline; set only while `Pending`
    pub expires_at: Option<DateTime<Utc>>,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Whether the hold deadline has passed at `now`
    ///
    /// A booking without a deadline (already terminal) is never lapsed.
    #[must_use]
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| now > deadline)
    }
}

// ============================================================================
// Selection
// ============================================================================

/// What a caller wants to hold: an anonymous unit count or specific seats
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Aggregate mode: any `n` units of capacity
    Quantity(NonZeroU32),
    /// Granular mode: these exact seats
    Seats(Vec<SeatId>),
}

impl Selection {
    /// Aggregate selection of `n` units; `None` when `n` is zero
    #[must_use]
    pub const fn quantity(n: u32) -> Option<Self> {
        match NonZeroU32::new(n) {
            Some(n) => Some(Self::Quantity(n)),
            None => None,
        }
    }

    /// Granular selection of specific seats
    ///
    /// Duplicates are removed and the seats are sorted ascending, which is
    /// also the order their rows are locked in.
    #[must_use]
    pub fn seats(mut seats: Vec<SeatId>) -> Self {
        seats.sort_unstable();
        seats.dedup();
        Self::Seats(seats)
    }

    /// Number of units this selection covers
    #[must_use]
    pub fn units(&self) -> u32 {
        match self {
            Self::Quantity(n) => n.get(),
            Self::Seats(seats) => u32::try_from(seats.len()).unwrap_or(u32::MAX),
        }
    }

    /// Whether the selection names no units at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::Quantity(_) => false,
            Self::Seats(seats) => seats.is_empty(),
        }
    }
}

// ============================================================================
// Seating plan
// ============================================================================

/// Per-tier prices for a published show
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPrices {
    /// Price of a VIP (front) seat
    pub vip: Money,
    /// Price of a premium (middle) seat
    pub premium: Money,
    /// Price of a regular (back) seat
    pub regular: Money,
}

/// Seat-grid layout used when publishing a show in granular mode
///
/// Rows are labelled `A`, `B`, ... from the front. The front third of the
/// rows is VIP, the middle third premium, and the back third regular.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingPlan {
    /// Number of rows
    pub rows: u32,
    /// Seats in each row
    pub seats_per_row: u32,
    /// Prices per tier
    pub prices: TierPrices,
}

impl SeatingPlan {
    /// Total number of seats the plan generates
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.rows.saturating_mul(self.seats_per_row)
    }

    /// Tier of the given zero-based row index
    #[must_use]
    pub const fn tier_of_row(&self, row_index: u32) -> SeatTier {
        let third = if self.rows < 3 { 1 } else { self.rows / 3 };
        if row_index < third {
            SeatTier::Vip
        } else if row_index < third * 2 {
            SeatTier::Premium
        } else {
            SeatTier::Regular
        }
    }

    /// Price of the given tier
    #[must_use]
    pub const fn price_of(&self, tier: SeatTier) -> Money {
        match tier {
            SeatTier::Regular => self.prices.regular,
            SeatTier::Premium => self.prices.premium,
            SeatTier::Vip => self.prices.vip,
        }
    }

    /// Generates the full seat grid for a show, all seats `Available`
    #[must_use]
    pub fn generate(&self, show_id: ShowId) -> Vec<Seat> {
        let mut seats = Vec::with_capacity(self.capacity() as usize);
        for row_index in 0..self.rows {
            let tier = self.tier_of_row(row_index);
            let row = row_label(row_index);
            for number in 1..=self.seats_per_row {
                seats.push(Seat {
                    id: SeatId::new(),
                    show_id,
                    row: row.clone(),
                    number,
                    tier,
                    price: self.price_of(tier),
                    status: SeatStatus::Available,
                    booking_id: None,
                });
            }
        }
        seats
    }
}

/// Spreadsheet-style row label: `A`..`Z`, then `AA`, `AB`, ...
fn row_label(mut index: u32) -> String {
    let mut label = Vec::new();
    loop {
        label.push(b'A' + u8::try_from(index % 26).unwrap_or(0));
        index /= 26;
        if index == 0 {
            break;
        }
        index -= 1;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn booking_status_terminality() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Expired.is_terminal());
        assert!(BookingStatus::Failed.is_terminal());
    }

    #[test]
    fn status_round_trips_through_storage_repr() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Expired,
            BookingStatus::Failed,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("UNKNOWN"), None);
        for status in [SeatStatus::Available, SeatStatus::Locked, SeatStatus::Booked] {
            assert_eq!(SeatStatus::parse(status.as_str()), Some(status));
        }
        for tier in [SeatTier::Regular, SeatTier::Premium, SeatTier::Vip] {
            assert_eq!(SeatTier::parse(tier.as_str()), Some(tier));
        }
    }

    #[test]
    fn inventory_available_never_underflows() {
        let inventory = ShowInventory {
            show_id: ShowId::new(),
            total_units: 10,
            reserved_units: 7,
            confirmed_units: 3,
        };
        assert_eq!(inventory.available(), 0);

        let inconsistent = ShowInventory {
            reserved_units: 20,
            ..inventory
        };
        assert_eq!(inconsistent.available(), 0);
    }

    #[test]
    fn booking_lapses_strictly_after_deadline() {
        let now = Utc::now();
        let booking = Booking {
            id: BookingId::new(),
            show_id: ShowId::new(),
            user_id: UserId::new(),
            status: BookingStatus::Pending,
            units: 1,
            expires_at: Some(now),
            created_at: now - Duration::minutes(2),
        };
        assert!(!booking.is_lapsed(now));
        assert!(booking.is_lapsed(now + Duration::seconds(1)));

        let confirmed = Booking {
            status: BookingStatus::Confirmed,
            expires_at: None,
            ..booking
        };
        assert!(!confirmed.is_lapsed(now + Duration::hours(1)));
    }

    #[test]
    fn selection_quantity_rejects_zero() {
        assert!(Selection::quantity(0).is_none());
        assert_eq!(Selection::quantity(3).unwrap().units(), 3);
    }

    #[test]
    fn selection_seats_sorts_and_dedups() {
        let a = SeatId::new();
        let b = SeatId::new();
        let selection = Selection::seats(vec![b, a, b]);
        let Selection::Seats(seats) = &selection else {
            panic!("expected seat selection");
        };
        assert_eq!(seats.len(), 2);
        assert!(seats[0] < seats[1]);
        assert_eq!(selection.units(), 2);
        assert!(Selection::seats(Vec::new()).is_empty());
    }

    #[test]
    fn seating_plan_generates_tiered_grid() {
        let plan = SeatingPlan {
            rows: 6,
            seats_per_row: 4,
            prices: TierPrices {
                vip: Money::from_cents(9000),
                premium: Money::from_cents(6000),
                regular: Money::from_cents(3000),
            },
        };
        let show_id = ShowId::new();
        let seats = plan.generate(show_id);
        assert_eq!(seats.len(), 24);

        // Front rows A/B are VIP, C/D premium, E/F regular.
        let tier_of = |row: &str| {
            seats
                .iter()
                .find(|s| s.row == row)
                .map(|s| s.tier)
                .unwrap()
        };
        assert_eq!(tier_of("A"), SeatTier::Vip);
        assert_eq!(tier_of("C"), SeatTier::Premium);
        assert_eq!(tier_of("F"), SeatTier::Regular);

        assert!(seats.iter().all(|s| s.show_id == show_id));
        assert!(seats.iter().all(|s| s.status == SeatStatus::Available));
        assert!(seats.iter().all(|s| s.booking_id.is_none()));

        let vip_price = seats
            .iter()
            .find(|s| s.tier == SeatTier::Vip)
            .map(|s| s.price)
            .unwrap();
        assert_eq!(vip_price, Money::from_cents(9000));
    }

    #[test]
    fn row_labels_extend_past_z() {
        assert_eq!(row_label(0), "A");
        assert_eq!(row_label(25), "Z");
        assert_eq!(row_label(26), "AA");
        assert_eq!(row_label(27), "AB");
    }

    #[test]
    fn money_display_pads_cents() {
        assert_eq!(Money::from_cents(150).to_string(), "$1.50");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn row_labels_are_unique(a in 0u32..2000, b in 0u32..2000) {
                prop_assume!(a != b);
                prop_assert_ne!(row_label(a), row_label(b));
            }

            #[test]
            fn available_never_exceeds_total(
                total in 0u32..10_000,
                reserved in 0u32..10_000,
                confirmed in 0u32..10_000,
            ) {
                let inventory = ShowInventory {
                    show_id: ShowId::from_uuid(Uuid::nil()),
                    total_units: total,
                    reserved_units: reserved,
                    confirmed_units: confirmed,
                };
                prop_assert!(inventory.available() <= total);
            }

            #[test]
            fn checked_dollars_agree_with_cents(dollars in 0u64..1_000_000) {
                let money = Money::checked_from_dollars(dollars).unwrap();
                prop_assert_eq!(money.cents(), dollars * 100);
            }
        }
    }
}
