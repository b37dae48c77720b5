//! Wire-level packets for synthetic text entities.
//!
//! A hologram line is presented to a client as an entity that only ever
//! exists on that client's side of the connection. Three packet shapes are
//! enough to drive the whole lifecycle: spawn the marker entity, attach the
//! line of text to it, and destroy it again. This crate defines those
//! packets, the fixed-point position encoding the wire uses, and a small
//! binary codec over [`Read`]/[`Write`].

use std::io::{Error, ErrorKind, Read, Write};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Entity type tag for the invisible marker entity that carries a line of
/// text. The entity has no body, no hitbox and no behavior on the client.
pub const MARKER_ENTITY_TYPE: i32 = 78;

/// Wire resolution of entity coordinates: 1/32 of a world unit.
const POSITION_SCALE: f32 = 32.0;

// Metadata registers of the marker entity, and the flag bytes they take.
const REG_ENTITY_FLAGS: u8 = 0;
const REG_CUSTOM_NAME: u8 = 2;
const REG_NAME_VISIBLE: u8 = 3;
const REG_STAND_STATUS: u8 = 10;
const FLAG_INVISIBLE: u8 = 0x20;
const STAND_STATUS_UNANCHORED: u8 = 0x1f;

const ENTRY_BYTE: u8 = 0;
const ENTRY_TEXT: u8 = 1;

/// Encode a world coordinate as a fixed-point integer at 1/32-unit
/// resolution.
pub fn fixed_point(coordinate: f32) -> i32 {
    (coordinate * POSITION_SCALE).floor() as i32
}

/// Discriminates the three packet shapes on the wire.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    SpawnEntity = 0,
    EntityMetadata = 1,
    DestroyEntities = 2,
}

/// Creates one synthetic entity on a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntity {
    pub entity_id: i32,
    /// Fixed-point coordinates, see [`fixed_point`].
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub velocity: [i32; 3],
    pub yaw: i32,
    pub pitch: i32,
    pub entity_type: i32,
    pub object_data: i32,
}

impl SpawnEntity {
    /// Spawn packet for a marker entity at `position`, with a zeroed
    /// velocity and orientation payload.
    pub fn marker(entity_id: i32, position: Vec3) -> Self {
        Self {
            entity_id,
            x: fixed_point(position.x),
            y: fixed_point(position.y),
            z: fixed_point(position.z),
            velocity: [0; 3],
            yaw: 0,
            pitch: 0,
            entity_type: MARKER_ENTITY_TYPE,
            object_data: 0,
        }
    }
}

/// Display attributes of one text line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAttributes {
    pub text: String,
    pub custom_name_visible: bool,
    pub invisible: bool,
    pub no_gravity: bool,
}

impl TextAttributes {
    /// The attribute set every hologram line uses: an invisible, unanchored
    /// entity whose name tag is the visible text.
    pub fn for_line(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            custom_name_visible: true,
            invisible: true,
            no_gravity: true,
        }
    }
}

/// Attaches (or replaces) the text shown for an already-spawned entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub entity_id: i32,
    pub attributes: TextAttributes,
}

impl EntityMetadata {
    /// Metadata packet turning `entity_id` into a floating name tag reading
    /// `text`.
    pub fn name_tag(entity_id: i32, text: impl Into<String>) -> Self {
        Self {
            entity_id,
            attributes: TextAttributes::for_line(text),
        }
    }
}

/// Removes a batch of synthetic entities from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyEntities {
    pub entity_ids: Vec<i32>,
}

impl DestroyEntities {
    /// Destroy packet for a single entity.
    pub fn single(entity_id: i32) -> Self {
        Self {
            entity_ids: vec![entity_id],
        }
    }
}

/// One server-to-client message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Packet {
    SpawnEntity(SpawnEntity),
    EntityMetadata(EntityMetadata),
    DestroyEntities(DestroyEntities),
}

impl Packet {
    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::SpawnEntity(_) => PacketKind::SpawnEntity,
            Packet::EntityMetadata(_) => PacketKind::EntityMetadata,
            Packet::DestroyEntities(_) => PacketKind::DestroyEntities,
        }
    }
}

impl From<SpawnEntity> for Packet {
    fn from(packet: SpawnEntity) -> Self {
        Packet::SpawnEntity(packet)
    }
}

impl From<EntityMetadata> for Packet {
    fn from(packet: EntityMetadata) -> Self {
        Packet::EntityMetadata(packet)
    }
}

impl From<DestroyEntities> for Packet {
    fn from(packet: DestroyEntities) -> Self {
        Packet::DestroyEntities(packet)
    }
}

/// Failure to deliver a packet to one client.
#[derive(ThisError, Debug)]
pub enum DeliveryError {
    #[error("client {client} is no longer connected")]
    Disconnected { client: Uuid },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write `packet` as a kind byte, a big-endian payload length, and the
/// payload itself.
pub fn write_packet<W: Write>(packet: &Packet, writer: &mut W) -> std::io::Result<()> {
    let payload = encode_payload(packet);
    writer.write_all(&[packet.kind() as u8])?;
    writer.write_all(&(payload.len() as u32).to_be_bytes())?;
    writer.write_all(&payload)
}

/// Read one packet previously written with [`write_packet`].
pub fn read_packet<R: Read>(reader: &mut R) -> std::io::Result<Packet> {
    let mut kind = [0u8; 1];
    reader.read_exact(&mut kind)?;
    let mut length = [0u8; 4];
    reader.read_exact(&mut length)?;
    let mut payload = vec![0u8; u32::from_be_bytes(length) as usize];
    reader.read_exact(&mut payload)?;
    decode_payload(kind[0], &payload)
}

fn encode_payload(packet: &Packet) -> Vec<u8> {
    let mut payload = Vec::new();
    match packet {
        Packet::SpawnEntity(spawn) => {
            for value in [
                spawn.entity_id,
                spawn.x,
                spawn.y,
                spawn.z,
                spawn.velocity[0],
                spawn.velocity[1],
                spawn.velocity[2],
                spawn.yaw,
                spawn.pitch,
                spawn.entity_type,
                spawn.object_data,
            ] {
                put_i32(&mut payload, value);
            }
        }
        Packet::EntityMetadata(metadata) => {
            put_i32(&mut payload, metadata.entity_id);
            let attributes = &metadata.attributes;
            let mut entries = Vec::new();
            if attributes.invisible {
                entries.push((REG_ENTITY_FLAGS, Entry::Byte(FLAG_INVISIBLE)));
            }
            entries.push((REG_CUSTOM_NAME, Entry::Text(&attributes.text)));
            if attributes.custom_name_visible {
                entries.push((REG_NAME_VISIBLE, Entry::Byte(1)));
            }
            if attributes.no_gravity {
                entries.push((REG_STAND_STATUS, Entry::Byte(STAND_STATUS_UNANCHORED)));
            }
            payload.push(entries.len() as u8);
            for (register, entry) in entries {
                payload.push(register);
                match entry {
                    Entry::Byte(value) => {
                        payload.push(ENTRY_BYTE);
                        payload.push(value);
                    }
                    Entry::Text(value) => {
                        payload.push(ENTRY_TEXT);
                        put_str(&mut payload, value);
                    }
                }
            }
        }
        Packet::DestroyEntities(destroy) => {
            put_i32(&mut payload, destroy.entity_ids.len() as i32);
            for entity_id in &destroy.entity_ids {
                put_i32(&mut payload, *entity_id);
            }
        }
    }
    payload
}

enum Entry<'a> {
    Byte(u8),
    Text(&'a str),
}

fn decode_payload(kind: u8, payload: &[u8]) -> std::io::Result<Packet> {
    let mut reader = payload;
    match kind {
        k if k == PacketKind::SpawnEntity as u8 => {
            let entity_id = take_i32(&mut reader)?;
            let x = take_i32(&mut reader)?;
            let y = take_i32(&mut reader)?;
            let z = take_i32(&mut reader)?;
            let velocity = [
                take_i32(&mut reader)?,
                take_i32(&mut reader)?,
                take_i32(&mut reader)?,
            ];
            let yaw = take_i32(&mut reader)?;
            let pitch = take_i32(&mut reader)?;
            let entity_type = take_i32(&mut reader)?;
            let object_data = take_i32(&mut reader)?;
            Ok(SpawnEntity {
                entity_id,
                x,
                y,
                z,
                velocity,
                yaw,
                pitch,
                entity_type,
                object_data,
            }
            .into())
        }
        k if k == PacketKind::EntityMetadata as u8 => {
            let entity_id = take_i32(&mut reader)?;
            let count = take_u8(&mut reader)?;
            let mut attributes = TextAttributes {
                text: String::new(),
                custom_name_visible: false,
                invisible: false,
                no_gravity: false,
            };
            for _ in 0..count {
                let register = take_u8(&mut reader)?;
                let entry_type = take_u8(&mut reader)?;
                match (register, entry_type) {
                    (REG_ENTITY_FLAGS, ENTRY_BYTE) => {
                        attributes.invisible = take_u8(&mut reader)? & FLAG_INVISIBLE != 0;
                    }
                    (REG_CUSTOM_NAME, ENTRY_TEXT) => {
                        attributes.text = take_str(&mut reader)?;
                    }
                    (REG_NAME_VISIBLE, ENTRY_BYTE) => {
                        attributes.custom_name_visible = take_u8(&mut reader)? != 0;
                    }
                    (REG_STAND_STATUS, ENTRY_BYTE) => {
                        attributes.no_gravity =
                            take_u8(&mut reader)? & STAND_STATUS_UNANCHORED != 0;
                    }
                    _ => {
                        return Err(Error::new(
                            ErrorKind::InvalidData,
                            format!("unknown metadata register {register}"),
                        ))
                    }
                }
            }
            Ok(EntityMetadata {
                entity_id,
                attributes,
            }
            .into())
        }
        k if k == PacketKind::DestroyEntities as u8 => {
            let count = take_i32(&mut reader)?;
            let mut entity_ids = Vec::with_capacity(count.max(0) as usize);
            for _ in 0..count {
                entity_ids.push(take_i32(&mut reader)?);
            }
            Ok(DestroyEntities { entity_ids }.into())
        }
        other => Err(Error::new(
            ErrorKind::InvalidData,
            format!("unknown packet kind {other}"),
        )),
    }
}

fn put_i32(payload: &mut Vec<u8>, value: i32) {
    payload.extend_from_slice(&value.to_be_bytes());
}

fn put_str(payload: &mut Vec<u8>, value: &str) {
    payload.extend_from_slice(&(value.len() as u32).to_be_bytes());
    payload.extend_from_slice(value.as_bytes());
}

fn take_u8(reader: &mut &[u8]) -> std::io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn take_i32(reader: &mut &[u8]) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn take_str(reader: &mut &[u8]) -> std::io::Result<String> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    let mut bytes = vec![0u8; u32::from_be_bytes(buf) as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| Error::new(ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_point() {
        assert_eq!(fixed_point(0.0), 0);
        assert_eq!(fixed_point(1.0), 32);
        assert_eq!(fixed_point(100.5), 3216);
        // floor, not truncation, on the negative side
        assert_eq!(fixed_point(-1.5), -48);
        assert_eq!(fixed_point(-0.01), -1);
    }

    #[test]
    fn test_marker_spawn() {
        let packet = SpawnEntity::marker(42, Vec3::new(10.0, 64.5, -3.25));
        assert_eq!(packet.entity_id, 42);
        assert_eq!([packet.x, packet.y, packet.z], [320, 2064, -104]);
        assert_eq!(packet.velocity, [0; 3]);
        assert_eq!(packet.yaw, 0);
        assert_eq!(packet.pitch, 0);
        assert_eq!(packet.entity_type, MARKER_ENTITY_TYPE);
        assert_eq!(packet.object_data, 0);
    }

    #[test]
    fn test_name_tag_attributes() {
        let packet = EntityMetadata::name_tag(7, "hello");
        assert!(packet.attributes.custom_name_visible);
        assert!(packet.attributes.invisible);
        assert!(packet.attributes.no_gravity);
        assert_eq!(packet.attributes.text, "hello");
    }

    #[test]
    fn test_spawn_round_trip() {
        let packet: Packet = SpawnEntity::marker(1234, Vec3::new(1.0, 2.0, 3.0)).into();
        let mut wire = Vec::new();
        write_packet(&packet, &mut wire).unwrap();
        // kind + length header + 11 ints
        assert_eq!(wire.len(), 1 + 4 + 11 * 4);
        assert_eq!(wire[0], PacketKind::SpawnEntity as u8);

        let decoded = read_packet(&mut wire.as_slice()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_metadata_round_trip() {
        let packet: Packet = EntityMetadata::name_tag(99, "Welcome, traveller").into();
        let mut wire = Vec::new();
        write_packet(&packet, &mut wire).unwrap();

        let decoded = read_packet(&mut wire.as_slice()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_metadata_registers() {
        let packet: Packet = EntityMetadata::name_tag(99, "x").into();
        let mut wire = Vec::new();
        write_packet(&packet, &mut wire).unwrap();

        let payload = &wire[5..];
        // entity id, then four entries
        assert_eq!(&payload[..4], &99i32.to_be_bytes());
        assert_eq!(payload[4], 4);
        assert_eq!(&payload[5..8], &[REG_ENTITY_FLAGS, ENTRY_BYTE, FLAG_INVISIBLE]);
        assert_eq!(&payload[8..10], &[REG_CUSTOM_NAME, ENTRY_TEXT]);
        let tail = &payload[15..];
        assert_eq!(&tail[..3], &[REG_NAME_VISIBLE, ENTRY_BYTE, 1]);
        assert_eq!(
            &tail[3..],
            &[REG_STAND_STATUS, ENTRY_BYTE, STAND_STATUS_UNANCHORED]
        );
    }

    #[test]
    fn test_destroy_round_trip() {
        let packet: Packet = DestroyEntities {
            entity_ids: vec![1, -5, i32::MAX],
        }
        .into();
        let mut wire = Vec::new();
        write_packet(&packet, &mut wire).unwrap();

        let decoded = read_packet(&mut wire.as_slice()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let wire = [9u8, 0, 0, 0, 0];
        let err = read_packet(&mut wire.as_slice()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_stream_of_packets() {
        let packets: Vec<Packet> = vec![
            SpawnEntity::marker(1, Vec3::ZERO).into(),
            EntityMetadata::name_tag(1, "line one").into(),
            DestroyEntities::single(1).into(),
        ];
        let mut wire = Vec::new();
        for packet in &packets {
            write_packet(packet, &mut wire).unwrap();
        }

        let mut reader = wire.as_slice();
        for packet in &packets {
            assert_eq!(&read_packet(&mut reader).unwrap(), packet);
        }
        assert!(reader.is_empty());
    }
}
