//! Dirty-field diffing for the profile update form.

use portal_protocol::{ProfilePatch, StudentProfile};

/// Fields of `edited` that differ from `current`. The record id and the
/// verification flags are not form fields and are never included.
pub fn diff_profile(current: &StudentProfile, edited: &StudentProfile) -> ProfilePatch {
    fn changed(current: &str, edited: &str) -> Option<String> {
        (current != edited).then(|| edited.to_string())
    }

    ProfilePatch {
        id: None,
        roll_no: changed(&current.roll_no, &edited.roll_no),
        name: changed(&current.name, &edited.name),
        email: changed(&current.email, &edited.email),
        mobile_number: changed(&current.mobile_number, &edited.mobile_number),
        father_mobile_number: changed(&current.father_mobile_number, &edited.father_mobile_number),
        date_of_birth: changed(&current.date_of_birth, &edited.date_of_birth),
        address: changed(&current.address, &edited.address),
        field_of_study: changed(&current.field_of_study, &edited.field_of_study),
        branch: changed(&current.branch, &edited.branch),
        taluka: changed(&current.taluka, &edited.taluka),
        city: changed(&current.city, &edited.city),
        district: changed(&current.district, &edited.district),
        pincode: changed(&current.pincode, &edited.pincode),
        is_data_verified: None,
        is_mobile_verified: None,
    }
}

/// Verification flags after a successful update: the data must be
/// re-confirmed, and mobile verification only survives an unchanged number.
pub fn verification_after_update(previous: &StudentProfile, submitted: &ProfilePatch) -> ProfilePatch {
    let mobile_changed = submitted
        .mobile_number
        .as_deref()
        .is_some_and(|mobile| mobile != previous.mobile_number);

    ProfilePatch {
        is_data_verified: Some(false),
        is_mobile_verified: Some(previous.is_mobile_verified && !mobile_changed),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> StudentProfile {
        StudentProfile {
            id: "7".to_string(),
            roll_no: "1024".to_string(),
            name: "Meera Suresh Patil".to_string(),
            email: "meera@example.edu".to_string(),
            mobile_number: "+919876543210".to_string(),
            city: "Pune".to_string(),
            is_data_verified: true,
            is_mobile_verified: true,
            ..Default::default()
        }
    }

    #[test]
    fn identical_profiles_have_no_changes() {
        assert!(diff_profile(&current(), &current()).is_empty());
    }

    #[test]
    fn only_changed_fields_are_included() {
        let mut edited = current();
        edited.city = "Nashik".to_string();
        edited.email = "meera.patil@example.edu".to_string();

        let patch = diff_profile(&current(), &edited);
        assert_eq!(patch.changed_fields(), vec!["email", "city"]);
        assert_eq!(patch.city.as_deref(), Some("Nashik"));
    }

    #[test]
    fn flags_and_id_are_never_diffed() {
        let mut edited = current();
        edited.id = "8".to_string();
        edited.is_data_verified = false;
        edited.is_mobile_verified = false;

        assert!(diff_profile(&current(), &edited).is_empty());
    }

    #[test]
    fn update_resets_data_verification() {
        let patch = ProfilePatch {
            city: Some("Nashik".to_string()),
            ..Default::default()
        };
        let flags = verification_after_update(&current(), &patch);
        assert_eq!(flags.is_data_verified, Some(false));
        assert_eq!(flags.is_mobile_verified, Some(true));
    }

    #[test]
    fn mobile_change_resets_mobile_verification() {
        let patch = ProfilePatch {
            mobile_number: Some("+919812345678".to_string()),
            ..Default::default()
        };
        let flags = verification_after_update(&current(), &patch);
        assert_eq!(flags.is_mobile_verified, Some(false));
    }

    #[test]
    fn unverified_mobile_stays_unverified() {
        let mut previous = current();
        previous.is_mobile_verified = false;
        let flags = verification_after_update(&previous, &ProfilePatch::default());
        assert_eq!(flags.is_mobile_verified, Some(false));
    }
}
