//! Integration tests for the mirror-core public API.
//!
//! These tests follow a host event all the way to the bytes the server
//! receives: coordinate mapping, key translation, message construction and
//! encoding, plus parsing of a video stream prefix.

use mirror_core::{
    decode_control_message, dom_code_to_android, encode_control_message, parse_configuration,
    protocol::{
        messages::{
            DeviceKeyMessage, DeviceTouchMessage, KeyAction, MotionAction, MotionButtons,
            PointerId, ScreenPosition,
        },
        video::{PacketHeader, METADATA_SIZE, PACKET_HEADER_SIZE},
    },
    to_device_space, ControlMessage, DeviceFrame, DeviceSize, Rotation, SurfaceRect, VideoCodec,
    VideoFrame, VideoPacket, VideoStreamMetadata,
};

const H264_SPS: &[u8] = &[
    0, 0, 0, 1, 0x67, 0x64, 0x00, 0x28, 0xAC, 0xD9, 0x40, 0x78, 0x02, 0x27, 0xE5, 0xC0, 0x44, 0x00,
    0x00, 0x03, 0x00, 0x04, 0x00, 0x00, 0x03, 0x00, 0xF0, 0x3C, 0x60, 0xC6, 0x58,
];

#[test]
fn test_rotated_tap_reaches_expected_device_pixel() {
    // Arrange: landscape device shown in a 400x200 box at (50, 50)
    let frame = DeviceFrame {
        bounds: Some(SurfaceRect::new(50.0, 50.0, 400.0, 200.0)),
        rotation: Rotation::Deg90,
        resolution: DeviceSize::new(2000, 1000),
    };

    // Act: tap a quarter of the way across, three quarters down
    let point = to_device_space(150.0, 200.0, &frame);
    let msg = ControlMessage::InjectTouch(DeviceTouchMessage {
        action: MotionAction::Down,
        pointer_id: PointerId::FINGER,
        position: ScreenPosition {
            x: point.x as i32,
            y: point.y as i32,
            screen_width: 2000,
            screen_height: 1000,
        },
        pressure: 1.0,
        action_button: MotionButtons::PRIMARY,
        buttons: MotionButtons::PRIMARY,
    });
    let bytes = encode_control_message(&msg);

    // Assert: (u, v) = (0.25, 0.75) rotates to (0.75, 0.75)
    assert_eq!(&bytes[10..14], &1500i32.to_be_bytes());
    assert_eq!(&bytes[14..18], &750i32.to_be_bytes());
    assert_eq!(&bytes[22..24], &[0xFF, 0xFF]);
}

#[test]
fn test_dom_key_becomes_keycode_message() {
    let keycode = dom_code_to_android("ArrowLeft").expect("arrow keys are mapped");
    let msg = ControlMessage::InjectKeycode(DeviceKeyMessage::keyboard(KeyAction::Down, keycode));

    let bytes = encode_control_message(&msg);
    let (decoded, consumed) = decode_control_message(&bytes).expect("decode must succeed");

    assert_eq!(consumed, bytes.len());
    assert_eq!(decoded, msg);
    assert_eq!(&bytes[2..6], &21u32.to_be_bytes());
}

#[test]
fn test_video_stream_prefix_parses() {
    // Arrange: metadata, configuration, one keyframe
    let metadata = VideoStreamMetadata {
        codec: VideoCodec::H264,
        width: 1920,
        height: 1088,
    };
    let config = VideoPacket::Configuration(H264_SPS.to_vec());
    let frame = VideoPacket::Frame(VideoFrame {
        pts: 33_333,
        keyframe: true,
        data: vec![0, 0, 0, 1, 0x65, 0x88],
    });
    let mut stream = metadata.encode().to_vec();
    stream.extend(config.encode());
    stream.extend(frame.encode());

    // Act
    let parsed_meta = VideoStreamMetadata::decode(&stream).expect("metadata");
    let mut offset = METADATA_SIZE;
    let mut packets = Vec::new();
    while offset < stream.len() {
        let header = PacketHeader::decode(&stream[offset..]).expect("header");
        offset += PACKET_HEADER_SIZE;
        let payload = stream[offset..offset + header.payload_len].to_vec();
        offset += header.payload_len;
        packets.push(header.into_packet(payload));
    }

    // Assert
    assert_eq!(parsed_meta, metadata);
    assert_eq!(packets, vec![config, frame]);
    let VideoPacket::Configuration(record) = &packets[0] else {
        panic!("first packet must be configuration");
    };
    let parsed = parse_configuration(parsed_meta.codec, record).expect("valid sps");
    assert_eq!((parsed.cropped_width, parsed.cropped_height), (1920, 1080));
}
