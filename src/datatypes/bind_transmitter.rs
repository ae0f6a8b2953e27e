use crate::codec::{
    CodecError, Decodable, Encodable, PduHeader, decode_cstring, decode_u8, encode_cstring,
};
use crate::datatypes::{
    CommandId, CommandStatus, InterfaceVersion, MAX_ADDRESS_RANGE_LENGTH, MAX_PASSWORD_LENGTH,
    MAX_SYSTEM_ID_LENGTH, MAX_SYSTEM_TYPE_LENGTH, NumericPlanIndicator, Tlv, TypeOfNumber, tags,
};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// BindTransmitter is used to bind a transmitter ESME to the SMSC.
#[derive(Clone, Debug, PartialEq)]
pub struct BindTransmitter {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // Body
    /// 5.2.1 system_id: This is the identification of the ESME requesting to
    ///       bind as a transmitter with the SMSC. It is a variable length
    ///       alphanumeric field of up to 16 characters including the NULL.
    pub system_id: String,

    /// 5.2.2 password: This is the password for authentication. If no
    ///       password is required by the SMSC, a NULL (i.e. zero) password
    ///       should be supplied.
    pub password: Option<String>,

    /// 5.2.3 system_type: This is used to categorize the type of ESME that is
    ///       binding to the SMSC. Examples include "VMS" (voice mail system)
    ///       and "OTA" (over-the-air activation system).
    pub system_type: String,

    /// 5.2.4 interface_version: Interface version level supported by the ESME.
    pub interface_version: InterfaceVersion,

    /// 5.2.5 addr_ton: Type of Number format of the ESME address(es) served
    ///       via this SMPP.
    pub addr_ton: TypeOfNumber,

    /// 5.2.6 addr_npi: Numbering Plan Indicator of the ESME address(es) served
    ///       via this SMPP.
    pub addr_npi: NumericPlanIndicator,

    /// 5.2.7 address_range: This is used to specify a range of SME addresses
    ///       serviced by the ESME. A single address may also be specified.
    pub address_range: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BindTransmitterValidationError {
    #[error("system_id exceeds maximum length of {MAX_SYSTEM_ID_LENGTH} characters ({} with null terminator): {actual}", MAX_SYSTEM_ID_LENGTH + 1)]
    SystemIdTooLong { actual: usize },

    #[error("password exceeds maximum length of {MAX_PASSWORD_LENGTH} characters ({} with null terminator): {actual}", MAX_PASSWORD_LENGTH + 1)]
    PasswordTooLong { actual: usize },

    #[error("system_type exceeds maximum length of {MAX_SYSTEM_TYPE_LENGTH} characters ({} with null terminator): {actual}", MAX_SYSTEM_TYPE_LENGTH + 1)]
    SystemTypeTooLong { actual: usize },

    #[error("address_range exceeds maximum length of {MAX_ADDRESS_RANGE_LENGTH} characters ({} with null terminator): {actual}", MAX_ADDRESS_RANGE_LENGTH + 1)]
    AddressRangeTooLong { actual: usize },
}

impl From<BindTransmitterValidationError> for CodecError {
    fn from(err: BindTransmitterValidationError) -> Self {
        let field = match err {
            BindTransmitterValidationError::SystemIdTooLong { .. } => "system_id",
            BindTransmitterValidationError::PasswordTooLong { .. } => "password",
            BindTransmitterValidationError::SystemTypeTooLong { .. } => "system_type",
            BindTransmitterValidationError::AddressRangeTooLong { .. } => "address_range",
        };
        CodecError::FieldValidation {
            field,
            reason: err.to_string(),
        }
    }
}

impl BindTransmitter {
    /// Validates the field length limits of the SMPP v3.4 specification
    pub fn validate(&self) -> Result<(), BindTransmitterValidationError> {
        if self.system_id.len() > MAX_SYSTEM_ID_LENGTH {
            return Err(BindTransmitterValidationError::SystemIdTooLong {
                actual: self.system_id.len(),
            });
        }

        if let Some(ref password) = self.password {
            if password.len() > MAX_PASSWORD_LENGTH {
                return Err(BindTransmitterValidationError::PasswordTooLong {
                    actual: password.len(),
                });
            }
        }

        if self.system_type.len() > MAX_SYSTEM_TYPE_LENGTH {
            return Err(BindTransmitterValidationError::SystemTypeTooLong {
                actual: self.system_type.len(),
            });
        }

        if self.address_range.len() > MAX_ADDRESS_RANGE_LENGTH {
            return Err(BindTransmitterValidationError::AddressRangeTooLong {
                actual: self.address_range.len(),
            });
        }

        Ok(())
    }

    /// Creates a builder for constructing BindTransmitter PDUs with validation
    pub fn builder() -> BindTransmitterBuilder {
        BindTransmitterBuilder::new()
    }
}

/// Builder for creating BindTransmitter PDUs with validation and sensible defaults
pub struct BindTransmitterBuilder {
    sequence_number: u32,
    system_id: String,
    password: Option<String>,
    system_type: String,
}

impl Default for BindTransmitterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BindTransmitterBuilder {
    pub fn new() -> Self {
        Self {
            sequence_number: 1,
            system_id: String::new(),
            password: None,
            system_type: String::new(),
        }
    }

    pub fn sequence_number(mut self, seq: u32) -> Self {
        self.sequence_number = seq;
        self
    }

    pub fn system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = system_id.into();
        self
    }

    /// An empty password is sent as a NULL password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.password = (!password.is_empty()).then_some(password);
        self
    }

    pub fn system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = system_type.into();
        self
    }

    /// Build the BindTransmitter, performing validation.
    ///
    /// A transmitter sends from any address, so the address fields stay
    /// unset and the interface version is always 3.4.
    pub fn build(self) -> Result<BindTransmitter, BindTransmitterValidationError> {
        let bind_transmitter = BindTransmitter {
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
            system_id: self.system_id,
            password: self.password,
            system_type: self.system_type,
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: String::new(),
        };

        bind_transmitter.validate()?;
        Ok(bind_transmitter)
    }
}

impl Encodable for BindTransmitter {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.validate()?;

        PduHeader {
            command_length: 0,
            command_id: CommandId::BindTransmitter,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        }
        .encode(buf);

        encode_cstring(buf, &self.system_id);
        encode_cstring(buf, self.password.as_deref().unwrap_or(""));
        encode_cstring(buf, &self.system_type);
        buf.put_u8(self.interface_version as u8);
        buf.put_u8(self.addr_ton as u8);
        buf.put_u8(self.addr_npi as u8);
        encode_cstring(buf, &self.address_range);

        Ok(())
    }
}

impl Decodable for BindTransmitter {
    fn command_id() -> CommandId {
        CommandId::BindTransmitter
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let system_id = decode_cstring(buf, MAX_SYSTEM_ID_LENGTH + 1, "system_id")?;
        let password = decode_cstring(buf, MAX_PASSWORD_LENGTH + 1, "password")?;
        let system_type = decode_cstring(buf, MAX_SYSTEM_TYPE_LENGTH + 1, "system_type")?;

        let raw = decode_u8(buf)?;
        let interface_version =
            InterfaceVersion::try_from(raw).map_err(|_| CodecError::FieldValidation {
                field: "interface_version",
                reason: format!("unsupported interface version {raw:#04x}"),
            })?;
        let raw = decode_u8(buf)?;
        let addr_ton = TypeOfNumber::try_from(raw).map_err(|_| CodecError::FieldValidation {
            field: "addr_ton",
            reason: format!("unknown type of number {raw:#04x}"),
        })?;
        let raw = decode_u8(buf)?;
        let addr_npi =
            NumericPlanIndicator::try_from(raw).map_err(|_| CodecError::FieldValidation {
                field: "addr_npi",
                reason: format!("unknown numbering plan {raw:#04x}"),
            })?;

        let address_range = decode_cstring(buf, MAX_ADDRESS_RANGE_LENGTH + 1, "address_range")?;

        Ok(BindTransmitter {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            password: (!password.is_empty()).then_some(password),
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindTransmitterResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,

    // body
    /// SMSC identifier. Empty when the SMSC rejects the bind without a body.
    pub system_id: String,
    pub sc_interface_version: Option<Tlv>,
}

impl BindTransmitterResponse {
    pub fn new(sequence_number: u32, system_id: impl Into<String>) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: system_id.into(),
            sc_interface_version: None,
        }
    }

    pub fn error(sequence_number: u32, command_status: CommandStatus) -> Self {
        Self {
            command_status,
            sequence_number,
            system_id: String::new(),
            sc_interface_version: None,
        }
    }
}

impl Encodable for BindTransmitterResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.system_id.len() > MAX_SYSTEM_ID_LENGTH {
            return Err(BindTransmitterValidationError::SystemIdTooLong {
                actual: self.system_id.len(),
            }
            .into());
        }

        PduHeader {
            command_length: 0,
            command_id: CommandId::BindTransmitterResp,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        }
        .encode(buf);

        encode_cstring(buf, &self.system_id);

        if let Some(tlv) = &self.sc_interface_version {
            tlv.encode(buf);
        }

        Ok(())
    }
}

impl Decodable for BindTransmitterResponse {
    fn command_id() -> CommandId {
        CommandId::BindTransmitterResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        // Rejections frequently come back header-only
        let system_id = if buf.has_remaining() {
            decode_cstring(buf, MAX_SYSTEM_ID_LENGTH + 1, "system_id")?
        } else {
            String::new()
        };

        let mut sc_interface_version = None;
        while buf.has_remaining() {
            let tlv = Tlv::decode(buf)?;
            if tlv.tag == tags::SC_INTERFACE_VERSION {
                sc_interface_version = Some(tlv);
            }
        }

        Ok(BindTransmitterResponse {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            sc_interface_version,
        })
    }
}
