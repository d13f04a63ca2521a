pub(crate) mod assembler;
pub(crate) mod enrollment;
pub(crate) mod identity;
pub(crate) mod ids;
pub(crate) mod lesson_content;
pub(crate) mod ownership;
pub(crate) mod visibility;
