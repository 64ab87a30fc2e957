mod user;
pub use user::{UserEntity, UserEntityCreateUpdate, UserSettingsUpdate};

mod login_token;
pub use login_token::{LoginToken, LoginTokenCreate};

mod course;
pub use course::{Course, CourseCreate, CourseWithProgressRow};

mod module;
pub use module::{Module, ModuleCreate, ModuleWithLessonsRow};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonWithStatusRow};

mod lesson_progress;
pub use lesson_progress::LessonProgress;

mod enrollment;
pub use enrollment::{Enrollment, EnrollmentWithCourseRow};

mod xp_event;
pub use xp_event::{XpBalance, XpEvent, XpReason};

mod certificate;
pub use certificate::{Certificate, CertificateDetailsRow, certificate_serial};

mod quiz;
pub use quiz::{Quiz, QuizCreate};

mod quiz_question;
pub use quiz_question::{QuizQuestion, QuizQuestionCreate};

mod quiz_answer;
pub use quiz_answer::{QuizAnswer, QuizAnswerCreate};

mod quiz_attempt;
pub use quiz_attempt::{
    AnswerSubmission, Grade, QuestionOutcome, QuizAttempt, QuizAttemptCreate, grade,
};

mod badge;
pub use badge::{Badge, BadgeCreate, BadgeCriteria, LearnerStats, UserBadgeRow, qualifying};

mod proposal;
pub use proposal::{Outcome, Proposal, ProposalCreate, ProposalStatus, Tally, VoteChoice};

mod educator;
pub use educator::{Educator, EducatorCreate, EducatorTier, valid_session_minutes};

mod mentorship_session;
pub use mentorship_session::{MentorshipSession, SessionParty, SessionStatus, TransitionDenied};

mod message;
pub use message::{InboxEntryRow, MAX_MESSAGE_CHARS, Message, normalize_body};
