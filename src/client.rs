
use std::error::Error;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use log::{debug, trace};
use serde_derive::Serialize;
use simple_error::bail;

/// Receives the test output of one testcase at a time.
pub trait Client {
    /// Start collecting results for `testcase`. Any results of a
    /// previous testcase that were not posted are discarded.
    fn declare_testcase(&mut self, suite: &str, revision: &str, testcase: &str)
                        -> Result<(), Box<dyn Error>>;

    /// Record `value` under `key` for the current testcase.
    fn check(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>>;

    /// Finish the current testcase.
    fn post(&mut self) -> Result<(), Box<dyn Error>>;
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TestcaseResult {
    pub key: String,
    pub value: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TestcaseRecord {
    pub suite: String,
    pub revision: String,
    pub testcase: String,
    pub results: Vec<TestcaseResult>,
}

impl TestcaseRecord {
    fn new(suite: &str, revision: &str, testcase: &str) -> TestcaseRecord {
        TestcaseRecord {
            suite: suite.to_string(),
            revision: revision.to_string(),
            testcase: testcase.to_string(),
            results: vec![],
        }
    }
}

// ------------------------------------------------------------------------

/// Keeps the results of every testcase as a JSON file under
/// `<root>/<suite>/<revision>/<testcase>/touca.json`.
pub struct ResultArchive {
    root: PathBuf,
    current: Option<TestcaseRecord>,
}

impl ResultArchive {
    pub fn new(root: &Path) -> ResultArchive {
        ResultArchive {
            root: root.to_path_buf(),
            current: None,
        }
    }

    pub fn record_path(&self, suite: &str, revision: &str, testcase: &str) -> PathBuf {
        self.root
            .join(suite)
            .join(revision)
            .join(testcase)
            .join("touca.json")
    }
}

/// Names become directories of the archive, each must stay one level deep.
fn check_segment(what: &str, name: &str) -> Result<(), Box<dyn Error>> {
    let mut comps = Path::new(name).components();
    let single = matches!((comps.next(), comps.next()), (Some(Component::Normal(_)), None));
    if !single || name.contains('/') || name.contains(MAIN_SEPARATOR) {
        bail!("Invalid {} name `{}`, it cannot be used as a directory name", what, name);
    }
    Ok(())
}

impl Client for ResultArchive {
    fn declare_testcase(&mut self, suite: &str, revision: &str, testcase: &str)
                        -> Result<(), Box<dyn Error>> {
        check_segment("suite", suite)?;
        check_segment("revision", revision)?;
        check_segment("testcase", testcase)?;
        if let Some(old) = &self.current {
            debug!("Discarding unposted results of testcase {}", old.testcase);
        }
        self.current = Some(TestcaseRecord::new(suite, revision, testcase));
        Ok(())
    }

    fn check(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let record = match self.current.as_mut() {
            Some(x) => x,
            None => bail!("Cannot record result `{}`, no testcase is declared", key),
        };
        trace!("Recording {} bytes as {}/{}", value.len(), record.testcase, key);
        record.results.push(TestcaseResult {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn post(&mut self) -> Result<(), Box<dyn Error>> {
        let record = match self.current.take() {
            Some(x) => x,
            None => bail!("Cannot post results, no testcase is declared"),
        };
        let path = self.record_path(&record.suite, &record.revision, &record.testcase);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        debug!("Saved {} results to {}", record.results.len(), path.display());
        Ok(())
    }
}

// ------------------------------------------------------------------------

/// In-memory client, keeps every posted testcase in order.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryClient {
    pub current: Option<TestcaseRecord>,
    pub posted: Vec<TestcaseRecord>,
}

#[cfg(test)]
impl MemoryClient {
    /// All `(testcase, key, value)` triples that were posted.
    pub fn triples(&self) -> Vec<(String, String, String)> {
        self.posted
            .iter()
            .flat_map(|r| {
                r.results
                    .iter()
                    .map(move |x| (r.testcase.clone(), x.key.clone(), x.value.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
impl Client for MemoryClient {
    fn declare_testcase(&mut self, suite: &str, revision: &str, testcase: &str)
                        -> Result<(), Box<dyn Error>> {
        self.current = Some(TestcaseRecord::new(suite, revision, testcase));
        Ok(())
    }

    fn check(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match self.current.as_mut() {
            Some(record) => record.results.push(TestcaseResult {
                key: key.to_string(),
                value: value.to_string(),
            }),
            None => bail!("no testcase declared"),
        };
        Ok(())
    }

    fn post(&mut self) -> Result<(), Box<dyn Error>> {
        match self.current.take() {
            Some(record) => self.posted.push(record),
            None => bail!("no testcase declared"),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_writes_one_file_per_testcase() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = ResultArchive::new(dir.path());

        archive.declare_testcase("suite", "v1", "first").unwrap();
        archive.check("output", "hello").unwrap();
        archive.post().unwrap();

        archive.declare_testcase("suite", "v1", "second").unwrap();
        archive.check("a_log", "A").unwrap();
        archive.check("b_log", "B").unwrap();
        archive.post().unwrap();

        let first = archive.record_path("suite", "v1", "first");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(first).unwrap()).unwrap();
        assert_eq!(json["testcase"], "first");
        assert_eq!(json["results"][0]["key"], "output");
        assert_eq!(json["results"][0]["value"], "hello");

        let second = archive.record_path("suite", "v1", "second");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(second).unwrap()).unwrap();
        assert_eq!(json["results"].as_array().unwrap().len(), 2);
        assert_eq!(json["results"][1]["value"], "B");
    }

    #[test]
    fn names_cannot_leave_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("results");
        let outside = dir.path().join("outside");
        let mut archive = ResultArchive::new(&root);

        let bad = [
            outside.to_string_lossy().to_string(),
            "../../../up".to_string(),
            "a/b".to_string(),
            "..".to_string(),
            ".".to_string(),
            "".to_string(),
        ];
        for name in bad.iter() {
            assert!(archive.declare_testcase("s", "local", name).is_err(), "{}", name);
            assert!(archive.declare_testcase(name, "local", "t").is_err(), "{}", name);
            assert!(archive.declare_testcase("s", name, "t").is_err(), "{}", name);
            assert!(archive.post().is_err());
        }
        assert!(!outside.join("touca.json").exists());
        assert!(!dir.path().join("up").exists());
        assert!(!root.exists());

        archive.declare_testcase("s", "v1.0", "out_a_log").unwrap();
        archive.post().unwrap();
        assert!(root.join("s").join("v1.0").join("out_a_log").join("touca.json").exists());
    }

    #[test]
    fn check_without_testcase_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = ResultArchive::new(dir.path());
        assert!(archive.check("output", "x").is_err());
        assert!(archive.post().is_err());
    }
}
