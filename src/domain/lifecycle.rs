use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Order delivery status. Advances strictly forward:
/// `pending -> assigned -> picked_up -> out_for_delivery -> delivered`,
/// with `cancelled` reachable from `pending` or `assigned` only.
/// `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Assigned,
    PickedUp,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Assigned => "assigned",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "assigned" => Some(OrderStatus::Assigned),
            "picked_up" => Some(OrderStatus::PickedUp),
            "out_for_delivery" => Some(OrderStatus::OutForDelivery),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment settlement state, orthogonal to [`OrderStatus`]: a `WALLET_REF`
/// order can be delivered while still `pending_verification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    PendingVerification,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::PendingVerification => "pending_verification",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "pending_verification" => Some(PaymentStatus::PendingVerification),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentMethod {
    #[serde(rename = "COD")]
    Cod,
    #[serde(rename = "WALLET_REF")]
    WalletRef,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "COD",
            PaymentMethod::WalletRef => "WALLET_REF",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COD" => Some(PaymentMethod::Cod),
            "WALLET_REF" => Some(PaymentMethod::WalletRef),
            _ => None,
        }
    }

    /// Payment status a freshly created order starts in. Wallet transfers
    /// wait for an external verification; cash settles on delivery.
    pub fn initial_payment_status(&self) -> PaymentStatus {
        match self {
            PaymentMethod::Cod => PaymentStatus::Unpaid,
            PaymentMethod::WalletRef => PaymentStatus::PendingVerification,
        }
    }

    /// Cash-on-delivery settles the moment the driver hands the order over.
    pub fn settles_on_delivery(&self) -> bool {
        matches!(self, PaymentMethod::Cod)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Driver,
    Restaurant,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Driver => "driver",
            Role::Restaurant => "restaurant",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Role::Customer),
            "driver" => Some(Role::Driver),
            "restaurant" => Some(Role::Restaurant),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is asking for a transition.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, Error, PartialEq)]
pub enum LifecycleError {
    /// Target state is not reachable from the current one; the machine never
    /// skips states and never leaves a terminal state.
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The actor's role (or driver identity) does not entitle them to this
    /// transition. State is left unchanged; retrying without a different
    /// identity is pointless.
    #[error("{role} is not allowed to move this order from {from} to {to}")]
    NotPermitted {
        role: Role,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Claim attempted on an order that already has a driver. Expected under
    /// contention; the caller refreshes their order list and moves on.
    #[error("order is already assigned to another driver")]
    AlreadyAssigned,
}

/// The single authority for order status changes. No other code path may
/// write an order's status.
///
/// `assigned_driver` is the driver currently on the order, if any. The claim
/// itself (`pending -> assigned`) must additionally be applied as a
/// compare-and-swap against storage; this check alone cannot arbitrate two
/// concurrent claimants.
pub fn check_transition(
    from: OrderStatus,
    to: OrderStatus,
    actor: &Actor,
    assigned_driver: Option<Uuid>,
) -> Result<(), LifecycleError> {
    use OrderStatus::*;

    match (from, to) {
        (Pending, Assigned) => {
            if actor.role != Role::Driver {
                return Err(LifecycleError::NotPermitted { role: actor.role, from, to });
            }
            if assigned_driver.is_some() {
                return Err(LifecycleError::AlreadyAssigned);
            }
            Ok(())
        }
        (Assigned, PickedUp) | (PickedUp, OutForDelivery) | (OutForDelivery, Delivered) => {
            if actor.role != Role::Driver || assigned_driver != Some(actor.id) {
                return Err(LifecycleError::NotPermitted { role: actor.role, from, to });
            }
            Ok(())
        }
        (Pending, Cancelled) | (Assigned, Cancelled) => {
            if !matches!(actor.role, Role::Restaurant | Role::Admin) {
                return Err(LifecycleError::NotPermitted { role: actor.role, from, to });
            }
            Ok(())
        }
        _ => Err(LifecycleError::InvalidTransition { from, to }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor { id: Uuid::new_v4(), role }
    }

    #[test]
    fn happy_path_advances_in_order() {
        use OrderStatus::*;
        let driver = actor(Role::Driver);

        assert!(check_transition(Pending, Assigned, &driver, None).is_ok());
        assert!(check_transition(Assigned, PickedUp, &driver, Some(driver.id)).is_ok());
        assert!(check_transition(PickedUp, OutForDelivery, &driver, Some(driver.id)).is_ok());
        assert!(check_transition(OutForDelivery, Delivered, &driver, Some(driver.id)).is_ok());
    }

    #[test]
    fn states_are_never_skipped() {
        use OrderStatus::*;
        let driver = actor(Role::Driver);

        assert_eq!(
            check_transition(Pending, OutForDelivery, &driver, None),
            Err(LifecycleError::InvalidTransition { from: Pending, to: OutForDelivery })
        );
        assert_eq!(
            check_transition(PickedUp, Delivered, &driver, Some(driver.id)),
            Err(LifecycleError::InvalidTransition { from: PickedUp, to: Delivered })
        );
    }

    #[test]
    fn status_never_moves_backwards() {
        use OrderStatus::*;
        let driver = actor(Role::Driver);
        assert!(matches!(
            check_transition(PickedUp, Assigned, &driver, Some(driver.id)),
            Err(LifecycleError::InvalidTransition { .. })
        ));
        assert!(matches!(
            check_transition(Delivered, OutForDelivery, &driver, Some(driver.id)),
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn terminal_states_are_frozen() {
        use OrderStatus::*;
        let admin = actor(Role::Admin);
        let driver = actor(Role::Driver);

        for from in [Delivered, Cancelled] {
            for to in [Pending, Assigned, PickedUp, OutForDelivery, Delivered, Cancelled] {
                assert!(matches!(
                    check_transition(from, to, &admin, None),
                    Err(LifecycleError::InvalidTransition { .. })
                ));
                assert!(matches!(
                    check_transition(from, to, &driver, Some(driver.id)),
                    Err(LifecycleError::InvalidTransition { .. })
                ));
            }
        }
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
    }

    #[test]
    fn claim_requires_driver_role_and_unclaimed_order() {
        use OrderStatus::*;

        for role in [Role::Customer, Role::Restaurant, Role::Admin] {
            assert!(matches!(
                check_transition(Pending, Assigned, &actor(role), None),
                Err(LifecycleError::NotPermitted { .. })
            ));
        }

        let loser = actor(Role::Driver);
        assert_eq!(
            check_transition(Pending, Assigned, &loser, Some(Uuid::new_v4())),
            Err(LifecycleError::AlreadyAssigned)
        );
    }

    #[test]
    fn only_the_assigned_driver_advances() {
        use OrderStatus::*;
        let assigned = Uuid::new_v4();
        let other_driver = actor(Role::Driver);

        assert!(matches!(
            check_transition(Assigned, PickedUp, &other_driver, Some(assigned)),
            Err(LifecycleError::NotPermitted { .. })
        ));
        assert!(matches!(
            check_transition(OutForDelivery, Delivered, &actor(Role::Admin), Some(assigned)),
            Err(LifecycleError::NotPermitted { .. })
        ));
    }

    #[test]
    fn cancel_is_restaurant_or_admin_and_only_before_pickup() {
        use OrderStatus::*;

        for role in [Role::Restaurant, Role::Admin] {
            assert!(check_transition(Pending, Cancelled, &actor(role), None).is_ok());
            assert!(
                check_transition(Assigned, Cancelled, &actor(role), Some(Uuid::new_v4())).is_ok()
            );
            // Once picked up, cancellation is an invalid transition.
            assert!(matches!(
                check_transition(PickedUp, Cancelled, &actor(role), Some(Uuid::new_v4())),
                Err(LifecycleError::InvalidTransition { .. })
            ));
        }

        assert!(matches!(
            check_transition(Pending, Cancelled, &actor(Role::Customer), None),
            Err(LifecycleError::NotPermitted { .. })
        ));
    }

    #[test]
    fn payment_method_drives_initial_and_delivery_settlement() {
        assert_eq!(
            PaymentMethod::Cod.initial_payment_status(),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            PaymentMethod::WalletRef.initial_payment_status(),
            PaymentStatus::PendingVerification
        );
        assert!(PaymentMethod::Cod.settles_on_delivery());
        // Wallet orders keep waiting for external verification even after
        // delivery; delivery is never blocked on payment.
        assert!(!PaymentMethod::WalletRef.settles_on_delivery());
    }

    #[test]
    fn round_trips_between_strings_and_enums() {
        for s in ["pending", "assigned", "picked_up", "out_for_delivery", "delivered", "cancelled"]
        {
            assert_eq!(OrderStatus::parse(s).map(|v| v.as_str()), Some(s));
        }
        assert!(OrderStatus::parse("shipped").is_none());
        assert_eq!(PaymentMethod::parse("COD"), Some(PaymentMethod::Cod));
        assert_eq!(PaymentMethod::parse("WALLET_REF"), Some(PaymentMethod::WalletRef));
        assert!(PaymentMethod::parse("cod").is_none());
        assert_eq!(Role::parse("driver"), Some(Role::Driver));
    }
}
