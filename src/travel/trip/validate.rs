//! 创建行程前的本地校验
//!
//! 规则按顺序检查，只报告第一条不满足的规则，校验不通过时不发任何请求。

use crate::travel::location::LocationData;
use crate::travel::trip::models::NewTrip;
use crate::travel::types::UserId;
use chrono::NaiveDate;
use thiserror::Error;

/// 校验失败（`Display` 即展示给用户的文案）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TripValidationError {
    #[error("Trip name is required.")]
    MissingTitle,
    #[error("Please select a destination from the dropdown.")]
    MissingDestination,
    #[error("Invalid destination selected.")]
    InvalidDestination,
    #[error("Start and end dates are required.")]
    MissingDates,
    #[error("Invalid dates.")]
    InvalidDates,
    #[error("Start date cannot be in the past.")]
    StartInPast,
    #[error("End date must be after start date.")]
    EndNotAfterStart,
    #[error("Select at least one buddy.")]
    NoInvitees,
}

/// 创建行程表单
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripDraft {
    pub title: String,
    /// 只能来自地点下拉框的选择结果，手输文本不算
    pub destination: Option<LocationData>,
    /// `YYYY-MM-DD`
    pub start_date: String,
    pub end_date: String,
    pub invited_user_ids: Vec<UserId>,
}

impl TripDraft {
    /// 勾选/取消勾选一个受邀搭子
    pub fn toggle_invitee(&mut self, user_id: UserId) {
        if let Some(pos) = self.invited_user_ids.iter().position(|id| *id == user_id) {
            self.invited_user_ids.remove(pos);
        } else {
            self.invited_user_ids.push(user_id);
        }
    }

    /// 校验并生成请求体；`today` 由调用方传入（本地日期）
    pub fn validate(&self, today: NaiveDate) -> Result<NewTrip, TripValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(TripValidationError::MissingTitle);
        }
        let dest = self
            .destination
            .as_ref()
            .ok_or(TripValidationError::MissingDestination)?;
        if dest.city.is_empty() || dest.country.is_empty() {
            return Err(TripValidationError::InvalidDestination);
        }
        if self.start_date.trim().is_empty() || self.end_date.trim().is_empty() {
            return Err(TripValidationError::MissingDates);
        }
        let start = parse_date(&self.start_date)?;
        let end = parse_date(&self.end_date)?;
        if start < today {
            return Err(TripValidationError::StartInPast);
        }
        if start >= end {
            return Err(TripValidationError::EndNotAfterStart);
        }
        if self.invited_user_ids.is_empty() {
            return Err(TripValidationError::NoInvitees);
        }

        Ok(NewTrip {
            title: title.to_string(),
            city: dest.city.clone(),
            region: Some(dest.region.clone()).filter(|r| !r.is_empty()),
            country: dest.country.clone(),
            latitude: dest.latitude,
            longitude: dest.longitude,
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            invited_user_ids: self.invited_user_ids.clone(),
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, TripValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| TripValidationError::InvalidDates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn goa() -> LocationData {
        LocationData {
            city: "Panaji".into(),
            region: String::new(),
            country: "India".into(),
            latitude: 15.49,
            longitude: 73.82,
            display_name: "Panaji, Goa, India".into(),
        }
    }

    fn valid() -> TripDraft {
        TripDraft {
            title: "  Summer Surf Weekend ".into(),
            destination: Some(goa()),
            start_date: "2026-11-01".into(),
            end_date: "2026-11-05".into(),
            invited_user_ids: vec![2],
        }
    }

    #[test]
    fn valid_draft_builds_payload() {
        let trip = valid().validate(today()).unwrap();
        assert_eq!(trip.title, "Summer Surf Weekend");
        assert_eq!(trip.region, None);
        assert_eq!(trip.invited_user_ids, vec![2]);

        let json = serde_json::to_value(&trip).unwrap();
        assert!(json["region"].is_null());
        assert_eq!(json["start_date"], "2026-11-01");
    }

    #[test]
    fn rules_are_checked_in_order() {
        let mut d = valid();
        d.title = "   ".into();
        d.destination = None;
        assert_eq!(d.validate(today()), Err(TripValidationError::MissingTitle));

        let mut d = valid();
        d.destination = None;
        d.start_date.clear();
        assert_eq!(
            d.validate(today()).unwrap_err().to_string(),
            "Please select a destination from the dropdown."
        );

        let mut d = valid();
        d.destination = Some(LocationData {
            country: String::new(),
            ..goa()
        });
        assert_eq!(d.validate(today()), Err(TripValidationError::InvalidDestination));

        let mut d = valid();
        d.end_date.clear();
        assert_eq!(d.validate(today()), Err(TripValidationError::MissingDates));

        let mut d = valid();
        d.start_date = "2026-10-18".into();
        assert_eq!(
            d.validate(today()).unwrap_err().to_string(),
            "Start date cannot be in the past."
        );

        let mut d = valid();
        d.end_date = d.start_date.clone();
        assert_eq!(d.validate(today()), Err(TripValidationError::EndNotAfterStart));

        let mut d = valid();
        d.invited_user_ids.clear();
        assert_eq!(
            d.validate(today()).unwrap_err().to_string(),
            "Select at least one buddy."
        );
    }

    #[test]
    fn start_today_is_allowed_and_garbage_dates_rejected() {
        let mut d = valid();
        d.start_date = "2026-10-19".into();
        assert!(d.validate(today()).is_ok());

        d.start_date = "next week".into();
        assert_eq!(d.validate(today()), Err(TripValidationError::InvalidDates));
    }

    #[test]
    fn toggle_invitee_adds_and_removes() {
        let mut d = TripDraft::default();
        d.toggle_invitee(3);
        d.toggle_invitee(4);
        d.toggle_invitee(3);
        assert_eq!(d.invited_user_ids, vec![4]);
    }
}
