//! Typed Google Calendar v3 resources
//!
//! Every field is optional and absent fields are omitted on output, so a
//! decode-then-encode pass keeps exactly the keys the schema recognizes.
//! `Resource` names the top-level types a tool can send or receive.

mod acl;
mod calendar;
mod channel;
mod colors;
mod event;
mod freebusy;
mod setting;

pub use acl::{Acl, AclRule, AclScope};
pub use calendar::{
    Calendar, CalendarList, CalendarListEntry, CalendarNotification, ConferenceProperties,
    NotificationSettings,
};
pub use channel::Channel;
pub use colors::{ColorDefinition, Colors};
pub use event::{
    ConferenceData, ConferenceParameters, ConferenceParametersAddOnParameters,
    ConferenceRequestStatus, ConferenceSolution, ConferenceSolutionKey, CreateConferenceRequest,
    EntryPoint, Event, EventAttachment, EventAttendee, EventDateTime, EventFocusTimeProperties,
    EventOutOfOfficeProperties, EventPerson, EventReminder, EventReminders, EventSource,
    EventWorkingLocationProperties, Events,
};
pub use freebusy::{
    FreeBusyCalendar, FreeBusyError, FreeBusyGroup, FreeBusyRequest, FreeBusyRequestItem,
    FreeBusyResponse, TimePeriod,
};
pub use setting::{Setting, Settings};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level resource a tool sends as its body or receives as its response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Acl,
    AclRule,
    Calendar,
    CalendarList,
    CalendarListEntry,
    Channel,
    Colors,
    Event,
    Events,
    FreeBusyRequest,
    FreeBusyResponse,
    Setting,
    Settings,
}

impl Resource {
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Acl => "Acl",
            Resource::AclRule => "AclRule",
            Resource::Calendar => "Calendar",
            Resource::CalendarList => "CalendarList",
            Resource::CalendarListEntry => "CalendarListEntry",
            Resource::Channel => "Channel",
            Resource::Colors => "Colors",
            Resource::Event => "Event",
            Resource::Events => "Events",
            Resource::FreeBusyRequest => "FreeBusyRequest",
            Resource::FreeBusyResponse => "FreeBusyResponse",
            Resource::Setting => "Setting",
            Resource::Settings => "Settings",
        }
    }

    /// Shape an argument map into a request body for this resource.
    ///
    /// Keys the resource does not know are dropped; values that do not fit
    /// the field types are an error.
    pub fn shape_body(&self, args: &Map<String, Value>) -> serde_json::Result<Vec<u8>> {
        let value = Value::Object(args.clone());
        match self {
            Resource::Acl => shape::<Acl>(value),
            Resource::AclRule => shape::<AclRule>(value),
            Resource::Calendar => shape::<Calendar>(value),
            Resource::CalendarList => shape::<CalendarList>(value),
            Resource::CalendarListEntry => shape::<CalendarListEntry>(value),
            Resource::Channel => shape::<Channel>(value),
            Resource::Colors => shape::<Colors>(value),
            Resource::Event => shape::<Event>(value),
            Resource::Events => shape::<Events>(value),
            Resource::FreeBusyRequest => shape::<FreeBusyRequest>(value),
            Resource::FreeBusyResponse => shape::<FreeBusyResponse>(value),
            Resource::Setting => shape::<Setting>(value),
            Resource::Settings => shape::<Settings>(value),
        }
    }

    /// Decode a response body as this resource and pretty-print it
    pub fn reformat(&self, body: &[u8]) -> serde_json::Result<String> {
        match self {
            Resource::Acl => reformat::<Acl>(body),
            Resource::AclRule => reformat::<AclRule>(body),
            Resource::Calendar => reformat::<Calendar>(body),
            Resource::CalendarList => reformat::<CalendarList>(body),
            Resource::CalendarListEntry => reformat::<CalendarListEntry>(body),
            Resource::Channel => reformat::<Channel>(body),
            Resource::Colors => reformat::<Colors>(body),
            Resource::Event => reformat::<Event>(body),
            Resource::Events => reformat::<Events>(body),
            Resource::FreeBusyRequest => reformat::<FreeBusyRequest>(body),
            Resource::FreeBusyResponse => reformat::<FreeBusyResponse>(body),
            Resource::Setting => reformat::<Setting>(body),
            Resource::Settings => reformat::<Settings>(body),
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn shape<T: DeserializeOwned + Serialize>(value: Value) -> serde_json::Result<Vec<u8>> {
    let typed: T = serde_json::from_value(value)?;
    serde_json::to_vec(&typed)
}

fn reformat<T: DeserializeOwned + Serialize>(body: &[u8]) -> serde_json::Result<String> {
    let typed: T = serde_json::from_slice(body)?;
    serde_json::to_string_pretty(&typed)
}
