use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use pipekit_rs::ci::build::{PipelineContext, PipelineSource, When};
use pipekit_rs::ci::expression::Statement;
use pipekit_rs::ci::status::{detailed_status, Build, StatusKind, User};
use pipekit_rs::ci::variables::Variables;
use pipekit_rs::pipekit::{ConfigLoader, Planner};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a variable expression
    Eval {
        /// The expression, e.g. '$CI_COMMIT_REF_NAME == "main"'
        expression: String,

        /// Variables as KEY=VALUE
        #[arg(short, long = "var")]
        vars: Vec<String>,
    },
    /// Plan the jobs of a pipeline from a configuration file
    Plan {
        /// Path to the configuration file
        #[arg(short, long, default_value = ".gitlab-ci.yml")]
        file: String,

        /// Branch or tag name
        #[arg(short, long = "ref")]
        ref_name: String,

        /// Treat the ref as a tag
        #[arg(short, long)]
        tag: bool,

        /// Pipeline source (push, web, schedule, merge_request_event, ...)
        #[arg(short, long, default_value = "push")]
        source: PipelineSource,

        /// Commit SHA
        #[arg(long)]
        sha: Option<String>,

        /// Pipeline variables as KEY=VALUE
        #[arg(short, long = "var")]
        vars: Vec<String>,

        /// Files present in the repository, for `exists:` rules
        #[arg(long = "file-present")]
        files: Vec<String>,
    },
    /// Show how a job status is presented
    Status {
        /// Job status (created, pending, running, success, failed, manual, ...)
        status: StatusKind,

        /// Job `when`
        #[arg(short, long, default_value = "on_success")]
        when: When,

        /// The job is allowed to fail
        #[arg(long)]
        allow_failure: bool,

        /// Present to a developer instead of an anonymous viewer
        #[arg(long)]
        developer: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Eval { expression, vars } => {
            let variables = Variables::from_pairs(&vars)?;
            let statement = Statement::new(&expression, &variables);
            let value = statement
                .evaluate()
                .with_context(|| format!("Failed to evaluate `{}`", expression))?;

            println!("value: {}", value);
            println!("truthful: {}", value.is_present());
        }
        Commands::Plan {
            file,
            ref_name,
            tag,
            source,
            sha,
            vars,
            files,
        } => {
            let config = ConfigLoader::new()
                .load_async(&file)
                .await
                .with_context(|| format!("Failed to load {}", file))?;

            let default_branch =
                std::env::var("PIPEKIT_DEFAULT_BRANCH").unwrap_or_else(|_| "main".to_string());
            let project_path = std::env::var("PIPEKIT_PROJECT_PATH").unwrap_or_default();
            log::info!(
                "Planning {} pipeline for {} (default branch {})",
                source,
                ref_name,
                default_branch
            );

            let mut pipeline = PipelineContext::new(ref_name, source)
                .with_tag(tag)
                .with_default_branch(default_branch)
                .with_project_path(project_path)
                .with_variables(Variables::from_pairs(&vars)?)
                .with_files(files);
            if let Some(sha) = sha {
                pipeline = pipeline.with_sha(sha);
            }

            let plan = Planner::new(&config).plan(&pipeline)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Status {
            status,
            when,
            allow_failure,
            developer,
        } => {
            let project_path = std::env::var("PIPEKIT_PROJECT_PATH")
                .unwrap_or_else(|_| "group/project".to_string());
            let job = Build::new(1, "job", project_path)
                .with_status(status)
                .with_when(when)
                .with_allow_failure(allow_failure);
            let user = if developer {
                User::developer("developer")
            } else {
                User::anonymous()
            };

            let detailed = detailed_status(&job, &user);
            println!("{}", serde_json::to_string_pretty(&detailed)?);
        }
    }

    Ok(())
}
