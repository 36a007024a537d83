//! Action receipts — signed proofs that an agent took an action.

pub mod action;
pub mod chain;
#[allow(clippy::module_inception)]
pub mod receipt;
pub mod verify;

pub use action::{ActionContent, ActionType};
pub use chain::verify_chain;
pub use receipt::{sign_action, ActionReceipt, ReceiptBuilder, ReceiptId};
pub use verify::{check_receipt, ReceiptVerification};
