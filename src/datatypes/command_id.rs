use num_enum::{FromPrimitive, IntoPrimitive};

/// The command_id of every SMPP v3.4 operation.
///
/// Only the session and keep-alive PDUs have codecs in this crate; the rest
/// are listed so that responses to them can be named in logs. Ids outside
/// the table land in `Other`.
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    GenericNack = 0x8000_0000,
    BindReceiver = 0x0000_0001,
    BindReceiverResp = 0x8000_0001,
    BindTransmitter = 0x0000_0002,
    BindTransmitterResp = 0x8000_0002,
    QuerySm = 0x0000_0003,
    QuerySmResp = 0x8000_0003,
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,
    ReplaceSm = 0x0000_0007,
    ReplaceSmResp = 0x8000_0007,
    CancelSm = 0x0000_0008,
    CancelSmResp = 0x8000_0008,
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,
    Outbind = 0x0000_000B,
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
    SubmitMulti = 0x0000_0021,
    SubmitMultiResp = 0x8000_0021,
    AlertNotification = 0x0000_0102,
    DataSm = 0x0000_0103,
    DataSmResp = 0x8000_0103,
    #[num_enum(catch_all)]
    Other(u32),
}

impl CommandId {
    /// Check if this command_id represents a response PDU
    pub fn is_response(&self) -> bool {
        u32::from(*self) & 0x8000_0000 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_ids_are_preserved() {
        let id = CommandId::from(0x0001_0200);
        assert_eq!(id, CommandId::Other(0x0001_0200));
        assert_eq!(u32::from(id), 0x0001_0200);
        assert!(!id.is_response());
        assert!(CommandId::from(0x8001_0200).is_response());
    }

    #[test]
    fn known_ids_round_trip() {
        assert_eq!(CommandId::from(0x0000_0002), CommandId::BindTransmitter);
        assert_eq!(u32::from(CommandId::EnquireLinkResp), 0x8000_0015);
    }
}
