use crate::db::models::Course;
use crate::services::identity::Identity;
use crate::services::ids;

/// What a caller may see of one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Visibility {
    pub(crate) show_course: bool,
    pub(crate) show_full_content: bool,
}

impl Visibility {
    const HIDDEN: Self = Self { show_course: false, show_full_content: false };
    const OUTLINE: Self = Self { show_course: true, show_full_content: false };
    const FULL: Self = Self { show_course: true, show_full_content: true };
}

/// Decision table, first match wins:
///
/// | caller              | published | enrolled | result  |
/// |---------------------|-----------|----------|---------|
/// | admin, teacher      | any       | any      | full    |
/// | student, anonymous  | no        | any      | hidden  |
/// | student, anonymous  | yes       | yes      | full    |
/// | student, anonymous  | yes       | no       | outline |
///
/// Hidden courses must be reported as missing, never as forbidden.
pub(crate) fn resolve(identity: &Identity, course: &Course) -> Visibility {
    match identity {
        Identity::Admin { .. } | Identity::Teacher { .. } => Visibility::FULL,
        Identity::Student { .. } | Identity::Anonymous if !course.is_published => {
            Visibility::HIDDEN
        }
        Identity::Student { subject_id } if is_enrolled(course, subject_id) => Visibility::FULL,
        Identity::Student { .. } | Identity::Anonymous => Visibility::OUTLINE,
    }
}

pub(crate) fn is_enrolled(course: &Course, subject_id: &str) -> bool {
    let subject = ids::normalize(subject_id);
    !subject.is_empty()
        && course.enrolled_user_ids().iter().any(|member| ids::normalize(member) == subject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::course_fixture;

    const STUDENT: &str = "65a1f0c2e4b0a1b2c3d4e5f6";

    fn student() -> Identity {
        Identity::Student { subject_id: STUDENT.to_string() }
    }

    #[test]
    fn staff_see_everything_regardless_of_publish_state() {
        let hidden = course_fixture("c1", "owner", false, &[]);
        let other_owner = Identity::Teacher { subject_id: "someone-else".into() };

        assert_eq!(resolve(&Identity::Admin { subject_id: "a".into() }, &hidden), Visibility::FULL);
        assert_eq!(resolve(&other_owner, &hidden), Visibility::FULL);
    }

    #[test]
    fn unpublished_course_is_hidden_even_from_enrolled_students() {
        let course = course_fixture("c1", "owner", false, &[STUDENT]);

        assert_eq!(resolve(&student(), &course), Visibility::HIDDEN);
        assert_eq!(resolve(&Identity::Anonymous, &course), Visibility::HIDDEN);
    }

    #[test]
    fn published_course_shows_outline_to_outsiders() {
        let course = course_fixture("c1", "owner", true, &["someone"]);

        assert_eq!(resolve(&student(), &course), Visibility::OUTLINE);
        assert_eq!(resolve(&Identity::Anonymous, &course), Visibility::OUTLINE);
    }

    #[test]
    fn enrollment_matches_across_id_representations() {
        let legacy = [
            format!("ObjectId(\"{STUDENT}\")"),
            format!("{{\"$oid\": \"{STUDENT}\"}}"),
            STUDENT.to_ascii_uppercase(),
            format!(" {STUDENT} "),
        ];

        for stored in &legacy {
            let course = course_fixture("c1", "owner", true, &[stored.as_str()]);
            assert_eq!(resolve(&student(), &course), Visibility::FULL, "stored as {stored}");

            let upper = Identity::Student { subject_id: STUDENT.to_ascii_uppercase() };
            assert_eq!(resolve(&upper, &course), Visibility::FULL, "stored as {stored}");
        }
    }

    #[test]
    fn blank_subject_never_counts_as_enrolled() {
        let course = course_fixture("c1", "owner", true, &[""]);
        assert!(!is_enrolled(&course, " "));
    }
}
