//! Reserved names with runtime meaning.

use crate::module::Param;
use crate::Type;

pub const TAG: &str = "_tag";
pub const AMOUNT: &str = "_amount";
pub const SENDER: &str = "_sender";
pub const ORIGIN: &str = "_origin";
pub const RECIPIENT: &str = "_recipient";
pub const EVENTNAME: &str = "_eventname";
pub const EXCEPTION: &str = "_exception";

/// Read-only pseudo-field holding the contract balance.
pub const BALANCE: &str = "_balance";

pub const THIS_ADDRESS: &str = "_this_address";
pub const CREATION_BLOCK: &str = "_creation_block";
pub const SCILLA_VERSION: &str = "_scilla_version";

/// Implicit parameters of every contract.
pub fn implicit_contract_params() -> Vec<Param> {
    vec![
        Param::new(THIS_ADDRESS, Type::bystr20()),
        Param::new(CREATION_BLOCK, Type::bnum()),
        Param::new(SCILLA_VERSION, Type::uint32()),
    ]
}

/// Implicit parameters of every transition and procedure, in the order
/// procedures receive them.
pub fn implicit_component_params() -> Vec<Param> {
    vec![
        Param::new(SENDER, Type::bystr20()),
        Param::new(ORIGIN, Type::bystr20()),
        Param::new(AMOUNT, Type::uint128()),
    ]
}
