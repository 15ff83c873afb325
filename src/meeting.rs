//! Jitsi video rooms for mentoring sessions.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};

use crate::entities::sessions::SESSION_STATUS_SCHEDULED;
use crate::entities::Session;

pub const VIDEO_PROVIDER_JITSI: &str = "jitsi";
const ROOM_PREFIX: &str = "mg";

// Same unreserved set as JavaScript's encodeURIComponent.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Stable but opaque room name: `mg-{session_key}-{16 hex chars of sha256(session_key)}`.
pub fn room_name(session_key: &str) -> String {
    let digest = Sha256::digest(session_key.as_bytes());
    let hash = hex::encode(digest);
    format!("{}-{}-{}", ROOM_PREFIX, session_key, &hash[..16])
}

pub fn join_url(room_name: &str, base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), utf8_percent_encode(room_name, URI_COMPONENT))
}

/// Gives scheduled sessions without a join link a Jitsi room.
pub fn attach_meetings(sessions: &mut [Session], base_url: &str) {
    for session in sessions
        .iter_mut()
        .filter(|s| s.status == SESSION_STATUS_SCHEDULED && s.video_join_url.is_none())
    {
        let room = room_name(&session.key);
        session.video_join_url = Some(join_url(&room, base_url));
        session.video_room_name = Some(room);
        session.video_provider = Some(VIDEO_PROVIDER_JITSI.to_string());
    }
}
