use crate::core::metrics;
use crate::db::models::{Chapter, Course, Lesson};
use crate::repositories::ContentStore;
use crate::services::ids;

#[derive(Debug, Clone)]
pub(crate) struct ChapterWithLessons {
    pub(crate) chapter: Chapter,
    pub(crate) lessons: Vec<Lesson>,
}

#[derive(Debug, Clone)]
pub(crate) struct CourseWithContent {
    pub(crate) course: Course,
    pub(crate) chapters: Vec<ChapterWithLessons>,
    /// `false` when a chapter or lesson fetch failed and the tree is partial.
    pub(crate) complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssemblyStage {
    Chapters,
    Lessons,
}

impl AssemblyStage {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Chapters => "chapters",
            Self::Lessons => "lessons",
        }
    }
}

/// Builds the nested course tree.
///
/// With `show_full_content` unset the course comes back with no chapters and the
/// store is not touched. Otherwise every chapter is attached regardless of its own
/// publish flag. Fetch failures degrade to a partial tree instead of failing the
/// request; the result is flagged incomplete and the failure is logged.
pub(crate) async fn assemble(
    store: &dyn ContentStore,
    course: Course,
    show_full_content: bool,
) -> CourseWithContent {
    if !show_full_content {
        return CourseWithContent { course, chapters: Vec::new(), complete: true };
    }

    let mut chapters = match store.list_chapters(&ids::representations(&course.id)).await {
        Ok(chapters) => chapters,
        Err(err) => {
            degrade(&course.id, None, AssemblyStage::Chapters, &err);
            return CourseWithContent { course, chapters: Vec::new(), complete: false };
        }
    };
    sort_chapters(&mut chapters);

    let mut complete = true;
    let mut nested = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        let lessons = match store.list_lessons(&chapter.id).await {
            Ok(mut lessons) => {
                sort_lessons(&mut lessons);
                lessons
            }
            Err(err) => {
                degrade(&course.id, Some(&chapter.id), AssemblyStage::Lessons, &err);
                complete = false;
                Vec::new()
            }
        };
        nested.push(ChapterWithLessons { chapter, lessons });
    }

    CourseWithContent { course, chapters: nested, complete }
}

// Equal positions fall back to insertion order. The sort is stable so rows that
// tie on every key keep the order the store returned them in.
pub(crate) fn sort_chapters(chapters: &mut [Chapter]) {
    chapters.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub(crate) fn sort_lessons(lessons: &mut [Lesson]) {
    lessons.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Position for an entry appended after `existing`.
pub(crate) fn next_position<I>(existing: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    existing.into_iter().max().map_or(0, |last| last.saturating_add(1))
}

fn degrade(
    course_id: &str,
    chapter_id: Option<&str>,
    stage: AssemblyStage,
    err: &dyn std::error::Error,
) {
    tracing::warn!(
        course_id,
        chapter_id,
        stage = stage.as_str(),
        error = %err,
        "content assembly degraded; returning partial course tree"
    );
    metrics::record_partial_assembly(stage.as_str());
}
