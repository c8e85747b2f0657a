//! On-disk framing for `TrainingExample` records: a little-endian `u32`
//! length prefix (via `byteorder`) followed by a `bincode` payload.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::game::TrainingExample;
use crate::inference::EncodedState;

#[derive(Serialize, Deserialize)]
struct WireExample {
    state_data: Vec<f32>,
    state_shape: Vec<usize>,
    choices: Vec<u8>,
    action: u8,
    reward: f32,
    next_state_data: Vec<f32>,
    next_state_shape: Vec<usize>,
    terminal: bool,
}

impl From<&TrainingExample> for WireExample {
    fn from(e: &TrainingExample) -> Self {
        WireExample {
            state_data: e.state.data.clone(),
            state_shape: e.state.shape.clone(),
            choices: e.choices.clone(),
            action: e.action,
            reward: e.reward,
            next_state_data: e.next_state.data.clone(),
            next_state_shape: e.next_state.shape.clone(),
            terminal: e.terminal,
        }
    }
}

impl From<WireExample> for TrainingExample {
    fn from(w: WireExample) -> Self {
        TrainingExample {
            state: EncodedState::new(w.state_data, w.state_shape),
            choices: w.choices,
            action: w.action,
            reward: w.reward,
            next_state: EncodedState::new(w.next_state_data, w.next_state_shape),
            terminal: w.terminal,
        }
    }
}

pub fn write_example<W: Write>(writer: &mut W, example: &TrainingExample) -> Result<(), Error> {
    let wire = WireExample::from(example);
    let payload = bincode::serialize(&wire).map_err(|e| Error::ProtocolError(e.to_string()))?;
    writer
        .write_u32::<LittleEndian>(payload.len() as u32)
        .map_err(|e| Error::ProtocolError(e.to_string()))?;
    writer.write_all(&payload).map_err(|e| Error::ProtocolError(e.to_string()))?;
    Ok(())
}

/// Read one record, or `None` at a clean end of stream.
pub fn read_example<R: Read>(reader: &mut R) -> Result<Option<TrainingExample>, Error> {
    let len = match reader.read_u32::<LittleEndian>() {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(Error::ProtocolError(e.to_string())),
    };
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).map_err(|e| Error::ProtocolError(e.to_string()))?;
    let wire: WireExample = bincode::deserialize(&buf).map_err(|e| Error::ProtocolError(e.to_string()))?;
    Ok(Some(wire.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_the_wire_format() {
        let example = TrainingExample {
            state: EncodedState::new(vec![1.0, 2.0], vec![2]),
            choices: vec![0, 1, 2],
            action: 1,
            reward: 0.5,
            next_state: EncodedState::new(vec![3.0, 4.0], vec![2]),
            terminal: false,
        };
        let mut buf = Vec::new();
        write_example(&mut buf, &example).unwrap();
        write_example(&mut buf, &example).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let first = read_example(&mut cursor).unwrap().unwrap();
        let second = read_example(&mut cursor).unwrap().unwrap();
        let eof = read_example(&mut cursor).unwrap();

        assert_eq!(first.action, 1);
        assert_eq!(first.state.data, vec![1.0, 2.0]);
        assert_eq!(second.reward, 0.5);
        assert!(eof.is_none());
    }
}
