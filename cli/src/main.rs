use campus::ConfigError;
use campus::model::entity::{
    Badge, BadgeCreate, BadgeCriteria, Course, CourseCreate, Lesson, LessonCreate, Module,
    ModuleCreate, Quiz, QuizAnswer, QuizAnswerCreate, QuizCreate, QuizQuestion,
    QuizQuestionCreate, UserEntity, UserEntityCreateUpdate,
};
use campus::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use campus::web::{AuthenticatedUser, UserRole};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the campus DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage course quizzes
    Quiz {
        #[command(subcommand)]
        action: QuizCommands,
    },

    /// Manage badges
    Badge {
        #[command(subcommand)]
        action: BadgeCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
        /// user, educator or admin
        #[arg(long, default_value = "user")]
        role: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        #[arg(long)]
        slug: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// XP granted on certification, 0 uses the configured bonus
        #[arg(long, default_value_t = 0)]
        xp_reward: i32,
        #[arg(long, default_value_t = false)]
        published: bool,
    },
}

/// Module management
#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        /// Slug of the course to attach the module to
        #[arg(long)]
        course_slug: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        /// Module title to attach the lesson to
        #[arg(long)]
        module_title: String,
        #[arg(long)]
        title: String,
        /// Path to a Markdown file with lesson content
        #[arg(long)]
        file: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
        #[arg(long, default_value_t = 10)]
        xp_reward: i32,
    },
}

/// Quiz management
#[derive(Subcommand, Debug)]
pub enum QuizCommands {
    Add {
        /// Slug of the course the quiz gates
        #[arg(long)]
        course_slug: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = 70)]
        pass_score: i32,
    },
    AddQuestion {
        /// Slug of the course whose quiz gets the question
        #[arg(long)]
        course_slug: String,
        #[arg(long)]
        question: String,
        #[arg(long, default_value = "")]
        explanation: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
    AddAnswer {
        /// Question text to attach the answer to
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer_text: String,
        #[arg(long, default_value_t = false)]
        is_correct: bool,
    },
}

/// Badge management
#[derive(Subcommand, Debug)]
pub enum BadgeCommands {
    Add {
        #[arg(long)]
        slug: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// first_lesson, lessons_completed, courses_completed or xp
        #[arg(long)]
        criteria: String,
        #[arg(long)]
        threshold: Option<i64>,
    },
}

async fn course_by_slug(mm: &ModelManager, actor: &AuthenticatedUser, slug: &str) -> campus::error::AppResult<Course> {
    Course::find_by_slug(mm, actor, slug)
        .await?
        .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound).into())
}

#[tokio::main]
async fn main() -> campus::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| ConfigError::Invalid("DATABASE_URL is not set"))?;
    let db_con = DbConnection::connect(&database_url)?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { username, password, email, role } => {
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        username,
                        password_hash: campus::auth::hash_password(&password)?,
                        email,
                        role: UserRole::from(role.as_str()),
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add { slug, title, description, xp_reward, published } => {
                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate {
                        slug,
                        title,
                        description,
                        xp_reward: Some(xp_reward),
                        published: Some(published),
                    },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Module { action } => match action {
            ModuleCommands::Add { course_slug, title, description, order_index } => {
                let course = course_by_slug(&mm, &actor, &course_slug).await?;
                let module = Module::create(
                    &mm,
                    &actor,
                    ModuleCreate {
                        course_id: course.id(),
                        title,
                        description,
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Module created: {:?}", module);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add { module_title, title, file, order_index, xp_reward } => {
                let module_id: uuid::Uuid = sqlx::query_scalar("SELECT id FROM modules WHERE title = $1")
                    .bind(&module_title)
                    .fetch_one(mm.executor())
                    .await
                    .map_err(DatabaseError::SqlxError)?;

                let content = std::fs::read_to_string(file)?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        module_id,
                        title,
                        content,
                        order_index: Some(order_index),
                        xp_reward: Some(xp_reward),
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
        },

        Commands::Quiz { action } => match action {
            QuizCommands::Add { course_slug, title, pass_score } => {
                let course = course_by_slug(&mm, &actor, &course_slug).await?;
                let quiz = Quiz::create(
                    &mm,
                    &actor,
                    QuizCreate {
                        course_id: course.id(),
                        title,
                        pass_score: Some(pass_score),
                    },
                )
                .await?;
                println!("Quiz created: {:?}", quiz);
            }

            QuizCommands::AddQuestion { course_slug, question, explanation, order_index } => {
                let course = course_by_slug(&mm, &actor, &course_slug).await?;
                let quiz = Quiz::find_by_course(&mm, &actor, course.id())
                    .await?
                    .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))?;

                let question = QuizQuestion::create(
                    &mm,
                    &actor,
                    QuizQuestionCreate {
                        quiz_id: quiz.id(),
                        question,
                        explanation,
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Question created: {:?}", question);
            }

            QuizCommands::AddAnswer { question, answer_text, is_correct } => {
                let question_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM quiz_questions WHERE question = $1")
                        .bind(&question)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?;

                let answer = QuizAnswer::create(
                    &mm,
                    &actor,
                    QuizAnswerCreate {
                        question_id,
                        answer_text,
                        is_correct: Some(is_correct),
                    },
                )
                .await?;
                println!("Answer created: {:?}", answer);
            }
        },

        Commands::Badge { action } => match action {
            BadgeCommands::Add { slug, title, description, criteria, threshold } => {
                let criteria = BadgeCriteria::parse(&criteria)
                    .ok_or(ConfigError::Invalid("unknown badge criteria"))?;
                let badge = Badge::create(
                    &mm,
                    &actor,
                    BadgeCreate {
                        slug,
                        title,
                        description,
                        criteria,
                        threshold,
                    },
                )
                .await?;
                println!("Badge created: {:?}", badge);
            }
        },
    }

    Ok(())
}
