use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::Contact;

/// Wire shape of a contact. Storage names stay internal; `id` goes out as `contact_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResource {
    pub contact_id: Uuid,
    pub name: String,
    pub email: String,
    pub company: String,
    /// DD/MM/YYYY
    pub birthday: String,
    /// Relative to the time of presentation, e.g. "3 minutes ago"
    pub last_updated: String,
}

impl ContactResource {
    pub fn present(contact: &Contact, now: DateTime<Utc>) -> Self {
        Self {
            contact_id: contact.id,
            name: contact.name.clone(),
            email: contact.email.clone(),
            company: contact.company.clone(),
            birthday: contact.birthday.format("%d/%m/%Y").to_string(),
            last_updated: diff_for_humans(contact.updated_at, now),
        }
    }

    pub fn collection(contacts: &[Contact], now: DateTime<Utc>) -> Vec<Self> {
        contacts.iter().map(|c| Self::present(c, now)).collect()
    }
}

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// "N unit(s) ago" / "N unit(s) from now", using the largest unit that fits.
/// Months are 30 days and years 365 days.
pub fn diff_for_humans(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then).num_seconds();
    let secs = delta.abs();

    let (count, unit) = match secs {
        s if s < MINUTE => (s.max(1), "second"),
        s if s < HOUR => (s / MINUTE, "minute"),
        s if s < DAY => (s / HOUR, "hour"),
        s if s < WEEK => (s / DAY, "day"),
        s if s < MONTH => (s / WEEK, "week"),
        s if s < YEAR => (s / MONTH, "month"),
        s => (s / YEAR, "year"),
    };

    let plural = if count == 1 { "" } else { "s" };
    let direction = if delta >= 0 { "ago" } else { "from now" };
    format!("{} {}{} {}", count, unit, plural, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn at(secs_before_now: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        (now - Duration::seconds(secs_before_now), now)
    }

    #[test]
    fn relative_times() {
        let cases = [
            (0, "1 second ago"),
            (1, "1 second ago"),
            (45, "45 seconds ago"),
            (60, "1 minute ago"),
            (3 * MINUTE + 20, "3 minutes ago"),
            (HOUR, "1 hour ago"),
            (5 * HOUR, "5 hours ago"),
            (DAY, "1 day ago"),
            (6 * DAY, "6 days ago"),
            (WEEK, "1 week ago"),
            (29 * DAY, "4 weeks ago"),
            (MONTH, "1 month ago"),
            (11 * MONTH, "11 months ago"),
            (YEAR, "1 year ago"),
            (3 * YEAR, "3 years ago"),
        ];
        for (secs, expected) in cases {
            let (then, now) = at(secs);
            assert_eq!(diff_for_humans(then, now), expected, "{} seconds", secs);
        }
    }

    #[test]
    fn future_times_read_from_now() {
        let (then, now) = at(-2 * HOUR);
        assert_eq!(diff_for_humans(then, now), "2 hours from now");
    }

    #[test]
    fn presents_wire_fields() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let contact = Contact {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "John Doe".to_string(),
            email: "johndoe@email.com".to_string(),
            birthday: NaiveDate::from_ymd_opt(2020, 5, 17).unwrap(),
            company: "Foo Company".to_string(),
            created_at: now - Duration::days(2),
            updated_at: now - Duration::minutes(3),
        };

        let resource = ContactResource::present(&contact, now);
        assert_eq!(resource.contact_id, contact.id);
        assert_eq!(resource.birthday, "17/05/2020");
        assert_eq!(resource.last_updated, "3 minutes ago");

        let json = serde_json::to_value(&resource).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("user_id").is_none());
        assert_eq!(json["company"], "Foo Company");
    }

    #[test]
    fn collection_presents_each_item_the_same_way() {
        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "A".to_string(),
            email: "a@example.com".to_string(),
            birthday: NaiveDate::from_ymd_opt(1997, 7, 23).unwrap(),
            company: "B".to_string(),
            created_at: now,
            updated_at: now,
        };

        let items = ContactResource::collection(std::slice::from_ref(&contact), now);
        assert_eq!(items, vec![ContactResource::present(&contact, now)]);
    }
}
