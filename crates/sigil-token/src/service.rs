//! Capability services carried inside an access token.
//!
//! Each service is a tagged segment: its type id, its privilege map, then a
//! payload specific to the service kind. Privilege ids are namespaced by
//! service type, so `RtcPrivilege::JoinChannel` and `RtmPrivilege::Login`
//! both use the value 1 without colliding.

use crate::error::TokenError;
use crate::packing::ByteWriter;
use std::collections::BTreeMap;

/// Service type id of the realtime media service.
pub const SERVICE_TYPE_RTC: u16 = 1;
/// Service type id of the messaging login service.
pub const SERVICE_TYPE_RTM: u16 = 2;

/// Privileges of the realtime media service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RtcPrivilege {
    JoinChannel = 1,
    PublishAudioStream = 2,
    PublishVideoStream = 3,
    PublishDataStream = 4,
}

impl RtcPrivilege {
    pub const ALL: [RtcPrivilege; 4] = [
        RtcPrivilege::JoinChannel,
        RtcPrivilege::PublishAudioStream,
        RtcPrivilege::PublishVideoStream,
        RtcPrivilege::PublishDataStream,
    ];
}

impl From<RtcPrivilege> for u16 {
    fn from(p: RtcPrivilege) -> Self {
        p as u16
    }
}

/// Privileges of the messaging service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RtmPrivilege {
    Login = 1,
}

impl From<RtmPrivilege> for u16 {
    fn from(p: RtmPrivilege) -> Self {
        p as u16
    }
}

/// Identity payload of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKind {
    /// Realtime media: channel name and participant id. An empty uid means
    /// "any participant".
    Rtc { channel_name: String, uid: String },
    /// Messaging login for a single user.
    Rtm { user_id: String },
}

/// A capability domain with its privileges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    kind: ServiceKind,
    privileges: BTreeMap<u16, u32>,
}

impl Service {
    /// Realtime media service for a numeric participant id. A uid of 0 packs
    /// as the empty string.
    pub fn rtc(channel_name: impl Into<String>, uid: u32) -> Self {
        let uid = if uid == 0 {
            String::new()
        } else {
            uid.to_string()
        };
        Self::with_kind(ServiceKind::Rtc {
            channel_name: channel_name.into(),
            uid,
        })
    }

    /// Realtime media service for a string user account, packed verbatim.
    pub fn rtc_with_account(channel_name: impl Into<String>, account: impl Into<String>) -> Self {
        Self::with_kind(ServiceKind::Rtc {
            channel_name: channel_name.into(),
            uid: account.into(),
        })
    }

    /// Messaging login service.
    pub fn rtm(user_id: impl Into<String>) -> Self {
        Self::with_kind(ServiceKind::Rtm {
            user_id: user_id.into(),
        })
    }

    fn with_kind(kind: ServiceKind) -> Self {
        Self {
            kind,
            privileges: BTreeMap::new(),
        }
    }

    pub fn service_type(&self) -> u16 {
        match self.kind {
            ServiceKind::Rtc { .. } => SERVICE_TYPE_RTC,
            ServiceKind::Rtm { .. } => SERVICE_TYPE_RTM,
        }
    }

    pub fn kind(&self) -> &ServiceKind {
        &self.kind
    }

    pub fn privileges(&self) -> &BTreeMap<u16, u32> {
        &self.privileges
    }

    /// Grant a privilege expiring `expire` seconds after issuance. Granting the
    /// same privilege again replaces its expiry.
    pub fn add_privilege(&mut self, privilege: impl Into<u16>, expire: u32) -> &mut Self {
        self.privileges.insert(privilege.into(), expire);
        self
    }

    /// Pack as `u16(type) || map_u32(privileges) || payload`.
    pub fn pack(&self, w: &mut ByteWriter) -> Result<(), TokenError> {
        w.put_u16(self.service_type())
            .put_map_u32("privileges", &self.privileges)?;

        match &self.kind {
            ServiceKind::Rtc { channel_name, uid } => {
                w.put_string("channel_name", channel_name)?
                    .put_string("uid", uid)?;
            }
            ServiceKind::Rtm { user_id } => {
                w.put_string("user_id", user_id)?;
            }
        }
        Ok(())
    }

    /// Packed bytes of this service alone.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TokenError> {
        let mut w = ByteWriter::new();
        self.pack(&mut w)?;
        Ok(w.into_bytes())
    }
}
