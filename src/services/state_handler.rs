use serde::Serialize;

use crate::codec::bencodex;
use crate::error::Result;
use crate::models::address::Address;
use crate::models::state::WorldInformation;
use crate::models::value::EncodedValue;
use crate::services::decoder::decode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateData<T> {
    pub address: Address,
    pub state: T,
}

/// Converts a raw account state into a typed document.
pub trait StateHandler {
    type State;

    fn convert(&self, address: Address, value: &EncodedValue) -> Result<StateData<Self::State>>;

    /// Hex-encoded Bencodex, as returned by the headless GraphQL API.
    fn convert_hex(&self, address: Address, hex: &str) -> Result<StateData<Self::State>> {
        let value = bencodex::decode_hex(hex)?;
        self.convert(address, &value)
    }
}

/// Keeps the decoded value as-is. Used where the caller decodes later.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawStateHandler;

impl StateHandler for RawStateHandler {
    type State = EncodedValue;

    fn convert(&self, address: Address, value: &EncodedValue) -> Result<StateData<EncodedValue>> {
        Ok(StateData {
            address,
            state: value.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WorldInformationStateHandler;

impl StateHandler for WorldInformationStateHandler {
    type State = WorldInformation;

    fn convert(&self, address: Address, value: &EncodedValue) -> Result<StateData<WorldInformation>> {
        let context = format!("world information {}", address);
        let state = decode::<WorldInformation>(value, &context)?;
        Ok(StateData { address, state })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::AppError;
    use crate::models::value::{Key, ValueKind};

    pub(crate) fn world_information_value() -> EncodedValue {
        let world = EncodedValue::dictionary([
            ("Id", EncodedValue::Integer(1)),
            ("Name", EncodedValue::text("Yggdrasil")),
            ("StageBegin", EncodedValue::Integer(1)),
            ("StageEnd", EncodedValue::Integer(50)),
            ("StageClearedId", EncodedValue::Integer(37)),
        ]);
        EncodedValue::Dictionary(BTreeMap::from([(Key::text("1"), world)]))
    }

    #[test]
    fn converts_world_information() {
        let address = Address::new([4; 20]);
        let data = WorldInformationStateHandler
            .convert(address, &world_information_value())
            .unwrap();
        assert_eq!(data.address, address);
        assert_eq!(data.state.worlds[&1].name, "Yggdrasil");
        assert_eq!(data.state.last_cleared_stage(), Some(37));
    }

    #[test]
    fn convert_hex_goes_through_codec() {
        let address = Address::new([4; 20]);
        let hex = bencodex::encode_hex(&world_information_value());
        let data = WorldInformationStateHandler.convert_hex(address, &hex).unwrap();
        assert_eq!(data.state.worlds.len(), 1);

        assert!(matches!(
            WorldInformationStateHandler.convert_hex(address, "zz"),
            Err(AppError::Codec(_))
        ));
    }

    #[test]
    fn raw_handler_keeps_the_decoded_value() {
        let address = Address::new([5; 20]);
        let hex = format!("0x{}", bencodex::encode_hex(&world_information_value()));
        let data = RawStateHandler.convert_hex(address, &hex).unwrap();
        assert_eq!(data.address, address);
        assert_eq!(data.state, world_information_value());
        assert!(matches!(
            RawStateHandler.convert_hex(address, "6e6e"),
            Err(AppError::Codec(_))
        ));
    }

    #[test]
    fn rejects_non_dictionary() {
        let err = WorldInformationStateHandler
            .convert(Address::new([4; 20]), &EncodedValue::List(vec![]))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::TypeMismatch { expected: ValueKind::Dictionary, .. }
        ));
    }
}
