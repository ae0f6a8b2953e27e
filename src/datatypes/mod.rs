mod bind_transmitter;
mod command_id;
mod command_status;
mod enquire_link;
mod generic_nack;
mod interface_version;
mod numeric_plan_indicator;
mod tlv;
mod type_of_number;
mod unbind;

pub use bind_transmitter::{
    BindTransmitter, BindTransmitterBuilder, BindTransmitterResponse,
    BindTransmitterValidationError,
};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use enquire_link::{EnquireLink, EnquireLinkResponse};
pub use generic_nack::GenericNack;
pub use interface_version::InterfaceVersion;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use tlv::{Tlv, tags};
pub use type_of_number::TypeOfNumber;
pub use unbind::{Unbind, UnbindResponse};

// SMPP v3.4 field length limits (excluding null terminator)
pub const MAX_SYSTEM_ID_LENGTH: usize = 15;
pub const MAX_PASSWORD_LENGTH: usize = 8;
pub const MAX_SYSTEM_TYPE_LENGTH: usize = 12;
pub const MAX_ADDRESS_RANGE_LENGTH: usize = 40;
