use rush_compose::CompositionEngine;
use rush_types::{AccountId, Amount, CarId};
use serde::{Deserialize, Serialize};

use crate::error::{WorkshopError, WorkshopResult};

/// Outcome of a repair, for the caller to settle payment against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReceipt {
    pub car_id: CarId,
    pub condition_before: u8,
    pub condition_after: u8,
    pub charged: Amount,
}

/// Repair pricing plus the account allowed to apply race wear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workshop {
    repair_price: Amount,
    repair_amount: u8,
    authority: Option<AccountId>,
}

impl Workshop {
    pub fn new(repair_price: Amount, repair_amount: u8) -> Self {
        Self {
            repair_price,
            repair_amount,
            authority: None,
        }
    }

    pub fn repair_price(&self) -> Amount {
        self.repair_price
    }

    pub fn set_repair_price(&mut self, price: Amount) {
        self.repair_price = price;
    }

    pub fn repair_amount(&self) -> u8 {
        self.repair_amount
    }

    pub fn authority(&self) -> Option<AccountId> {
        self.authority
    }

    pub fn set_authority(&mut self, authority: Option<AccountId>) {
        self.authority = authority;
    }

    /// The operator and the wired workshop authority may apply wear.
    pub fn is_authorized(&self, caller: &AccountId, operator: &AccountId) -> bool {
        caller == operator || self.authority.as_ref() == Some(caller)
    }

    /// Check a repair without touching state. Returns the amount to charge.
    pub fn check_repair(
        &self,
        engine: &CompositionEngine,
        caller: AccountId,
        car_id: CarId,
        payment: Amount,
    ) -> WorkshopResult<Amount> {
        let car = engine.get(car_id)?;
        if car.owner != caller {
            return Err(WorkshopError::NotOwner { car: car_id, account: caller });
        }
        if payment < self.repair_price {
            return Err(WorkshopError::InsufficientPayment {
                required: self.repair_price,
                attached: payment,
            });
        }
        Ok(payment)
    }

    /// Restore `repair_amount` condition points, saturating at the maximum.
    ///
    /// The whole attached payment is charged; a car already at full
    /// condition is still serviced.
    pub fn repair_car(
        &self,
        engine: &mut CompositionEngine,
        caller: AccountId,
        car_id: CarId,
        payment: Amount,
    ) -> WorkshopResult<RepairReceipt> {
        let charged = self.check_repair(engine, caller, car_id, payment)?;
        let condition_before = engine.get(car_id)?.condition;
        let condition_after = engine.restore_condition(car_id, self.repair_amount)?;
        tracing::info!(car = %car_id, condition_before, condition_after, "car repaired");
        Ok(RepairReceipt {
            car_id,
            condition_before,
            condition_after,
            charged,
        })
    }

    /// Lower a car's condition after a race. Returns the new condition.
    pub fn apply_wear(
        &self,
        engine: &mut CompositionEngine,
        caller: AccountId,
        operator: AccountId,
        car_id: CarId,
        amount: u8,
    ) -> WorkshopResult<u8> {
        if !self.is_authorized(&caller, &operator) {
            return Err(WorkshopError::Unauthorized(caller));
        }
        let condition = engine.apply_wear(car_id, amount)?;
        tracing::debug!(car = %car_id, amount, condition, "wear applied");
        Ok(condition)
    }
}
