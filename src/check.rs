
use std::collections::BTreeMap;
use std::error::Error;
use std::io::Read;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use clap::ArgMatches;
use lazy_static::lazy_static;
use regex::Regex;
use simple_error::require_with;
use simplelog::{debug, error, warn};

use crate::client::*;
use crate::config::Config;
use crate::runner::*;
use crate::utils::*;

/// Testcase name used for piped input without `--testcase`.
pub const STDIN_TESTCASE: &str = "stdout";

/// Key under which stdin and single file content is submitted.
pub const OUTPUT_KEY: &str = "output";

lazy_static! {
    static ref SLUG_CHARS: Regex =
        Regex::new(&format!("[./{}-]", regex::escape(&MAIN_SEPARATOR.to_string()))).unwrap();
}

pub struct CheckOptions {
    pub suite: String,
    pub revision: String,
    pub testcase: Option<String>,
    pub src: Option<PathBuf>,
    pub stdin_is_tty: bool,
    pub cwd: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
    Directory(PathBuf),
    Invalid(Option<PathBuf>),
}

impl InputSource {
    pub fn resolve(options: &CheckOptions) -> InputSource {
        if !options.stdin_is_tty {
            if let Some(src) = &options.src {
                warn!("Reading from standard input, {} is ignored", src.display());
            }
            return InputSource::Stdin;
        }
        let src = match &options.src {
            Some(x) => options.cwd.join(x),
            None => return InputSource::Invalid(None),
        };
        if src.is_file() {
            InputSource::File(src)
        } else if src.is_dir() {
            InputSource::Directory(src)
        } else {
            InputSource::Invalid(Some(src))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckStatus {
    /// A single testcase was submitted in one step.
    Completed,
    /// Every file of a directory was processed.
    Iterated,
    InvalidSource,
}

impl CheckStatus {
    pub fn as_bool(&self) -> bool {
        matches!(self, CheckStatus::Completed)
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CheckStatus::InvalidSource => 1,
            _ => 0,
        }
    }
}

/// Testcase name derived from a path: the path relative to `cwd` with
/// dots, dashes and path separators replaced by underscores.
pub fn slugify(file: &Path, cwd: &Path) -> String {
    let absolute = cwd.join(file);
    let relative: PathBuf = absolute
        .strip_prefix(cwd)
        .unwrap_or(absolute.as_path())
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();
    SLUG_CHARS
        .replace_all(&relative.to_string_lossy(), "_")
        .to_string()
}

/// Regular files directly inside `dir`, keyed by their slug.
pub fn list_testcases(dir: &Path, cwd: &Path)
                      -> Result<BTreeMap<String, PathBuf>, Box<dyn Error>> {
    let mut paths = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|x| x.path()))
        .collect::<Result<Vec<PathBuf>, std::io::Error>>()?;
    paths.sort();

    // On a slug collision the path that sorts last wins.
    let mut files = BTreeMap::new();
    for path in paths.into_iter().filter(|x| x.is_file()) {
        let slug = slugify(&path, cwd);
        if let Some(prev) = files.insert(slug.clone(), path) {
            warn!("Testcase {} is ambiguous, ignoring {}", slug, prev.display());
        }
    }
    Ok(files)
}

pub struct Check<'a, R: Read> {
    options: &'a CheckOptions,
    stdin: R,
}

impl<'a, R: Read> Check<'a, R> {
    pub fn new(options: &'a CheckOptions, stdin: R) -> Check<'a, R> {
        Check { options, stdin }
    }

    fn workflow(&self, testcases: Vec<String>) -> Workflow {
        Workflow {
            suite: self.options.suite.clone(),
            revision: self.options.revision.clone(),
            testcases,
        }
    }

    pub fn run(self, client: &mut dyn Client) -> Result<CheckStatus, Box<dyn Error>> {
        match InputSource::resolve(self.options) {
            InputSource::Stdin => self.submit_stdin(client),
            InputSource::File(path) => self.submit_file(client, &path),
            InputSource::Directory(path) => self.submit_directory(client, &path),
            InputSource::Invalid(path) => {
                match path {
                    Some(path) => debug!("Cannot use {} as input", path.display()),
                    None => debug!("No input path given"),
                };
                error!("specified path is neither a directory nor a file");
                Ok(CheckStatus::InvalidSource)
            }
        }
    }

    fn submit_stdin(mut self, client: &mut dyn Client)
                    -> Result<CheckStatus, Box<dyn Error>> {
        let testcase = self
            .options
            .testcase
            .clone()
            .unwrap_or_else(|| STDIN_TESTCASE.to_string());
        debug!("Reading test output from standard input");
        let workflow = self.workflow(vec![testcase]);
        let stdin = &mut self.stdin;
        run_workflow(client, &workflow, |_, c| {
            let content = read_stream_content(&mut *stdin)?;
            c.check(OUTPUT_KEY, &content)
        })?;
        Ok(CheckStatus::Completed)
    }

    fn submit_file(self, client: &mut dyn Client, file: &Path)
                   -> Result<CheckStatus, Box<dyn Error>> {
        let content = read_file_content(file)?;
        let testcase = match &self.options.testcase {
            Some(x) => x.clone(),
            None => slugify(file, &self.options.cwd),
        };
        run_workflow(client, &self.workflow(vec![testcase]), |_, c| {
            c.check(OUTPUT_KEY, &content)
        })?;
        Ok(CheckStatus::Completed)
    }

    fn submit_directory(self, client: &mut dyn Client, dir: &Path)
                        -> Result<CheckStatus, Box<dyn Error>> {
        let files = list_testcases(dir, &self.options.cwd)?;
        debug!("Found {} files in {}", files.len(), dir.display());

        let testcases = match &self.options.testcase {
            Some(x) => vec![x.clone()],
            None => files.keys().cloned().collect(),
        };
        let bulk = self.options.testcase.is_some();

        run_workflow(client, &self.workflow(testcases), |testcase, c| {
            if bulk {
                for (slug, file) in files.iter() {
                    c.check(slug, &read_file_content(file)?)?;
                }
                return Ok(());
            }
            match files.get(testcase) {
                Some(file) => c.check(testcase, &read_file_content(file)?),
                None => Ok(()),
            }
        })?;
        Ok(CheckStatus::Iterated)
    }
}

// -- touca check ---------------------------------------------------------

pub fn sc_check(args: &ArgMatches, stdin_is_tty: bool)
                -> Result<i32, Box<dyn Error>> {
    let config = Config::load()?;
    let options = CheckOptions {
        suite: require_with!(args.get_one::<String>("suite"), "clap error").to_string(),
        revision: config.revision_or(args.get_one::<String>("revision")),
        testcase: args.get_one::<String>("testcase").cloned(),
        src: args.get_one::<String>("src").map(PathBuf::from),
        stdin_is_tty,
        cwd: std::env::current_dir()?,
    };
    let output_directory =
        config.output_directory_or(args.get_one::<String>("output-directory"));
    debug!("Storing results in {}", output_directory.display());

    let mut archive = ResultArchive::new(&output_directory);
    let status = Check::new(&options, std::io::stdin().lock()).run(&mut archive)?;
    debug!("Check finished in one step: {}", status.as_bool());

    Ok(status.exit_code())
}
