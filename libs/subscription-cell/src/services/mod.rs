pub mod approval;
pub mod ledger;
pub mod payments;
pub mod plans;
pub mod redirect;
pub mod renewal;

pub use approval::{ApprovalHandle, ApprovalOutcome, ApprovalPoller};
pub use ledger::{compute_current_window, remaining_time};
pub use payments::PaymentService;
pub use plans::PlanService;
pub use redirect::{collect_signals, resolve_route};
pub use renewal::RenewalService;
