//! Request schemas for the SweepBright API.
//!
//! # Design
//! Each type is a marker implementing `RequestType`; the property list is the
//! wire contract. Build payloads with `RequestObject::new::<T>()` or
//! `RequestObject::from_input::<T>(..)`.

use crate::schema::{RequestType, TypeDescriptor};

/// Lead submitted through a general or estate-specific contact form.
#[derive(Debug, Clone, Copy)]
pub struct SaveContactRequest;

impl RequestType for SaveContactRequest {
    const NAME: &'static str = "SaveContactRequest";

    fn properties() -> Vec<(&'static str, TypeDescriptor)> {
        vec![
            ("first_name", TypeDescriptor::STRING),
            ("last_name", TypeDescriptor::STRING),
            ("email", TypeDescriptor::STRING),
            ("phone", TypeDescriptor::STRING),
            ("message", TypeDescriptor::STRING),
            ("locale", TypeDescriptor::STRING),
            ("preferences", TypeDescriptor::object::<SaveContactRequestPreferences>()),
            ("location_preference", TypeDescriptor::object::<SaveContactRequestLocationPreference>()),
        ]
    }
}

/// What kind of estate the lead is looking for.
#[derive(Debug, Clone, Copy)]
pub struct SaveContactRequestPreferences;

impl RequestType for SaveContactRequestPreferences {
    const NAME: &'static str = "SaveContactRequestPreferences";

    fn properties() -> Vec<(&'static str, TypeDescriptor)> {
        vec![
            ("negotiation", TypeDescriptor::STRING),
            ("types", TypeDescriptor::array_of(TypeDescriptor::STRING)),
            ("min_price", TypeDescriptor::NUMERIC),
            ("max_price", TypeDescriptor::NUMERIC),
            ("min_rooms", TypeDescriptor::INTEGER),
        ]
    }
}

/// Where the lead is looking.
#[derive(Debug, Clone, Copy)]
pub struct SaveContactRequestLocationPreference;

impl RequestType for SaveContactRequestLocationPreference {
    const NAME: &'static str = "SaveContactRequestLocationPreference";

    fn properties() -> Vec<(&'static str, TypeDescriptor)> {
        vec![
            ("country", TypeDescriptor::STRING),
            ("postal_codes", TypeDescriptor::array_of(TypeDescriptor::STRING)),
        ]
    }
}

/// Public URL of an estate on the agency website.
#[derive(Debug, Clone, Copy)]
pub struct SetEstateUrlRequest;

impl RequestType for SetEstateUrlRequest {
    const NAME: &'static str = "SetEstateUrlRequest";

    fn properties() -> Vec<(&'static str, TypeDescriptor)> {
        vec![("url", TypeDescriptor::STRING)]
    }
}
