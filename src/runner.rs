
use std::error::Error;
use std::time::Instant;

use simplelog::{debug, info};

use crate::client::Client;

pub struct Workflow {
    pub suite: String,
    pub revision: String,
    pub testcases: Vec<String>,
}

/// Runs `callback` once for every testcase of the workflow, in order.
///
/// The client is told about each testcase before the callback runs and
/// the results are posted right after. The first error stops the run.
pub fn run_workflow<F>(client: &mut dyn Client, workflow: &Workflow, mut callback: F)
                       -> Result<usize, Box<dyn Error>>
where
    F: FnMut(&str, &mut dyn Client) -> Result<(), Box<dyn Error>>,
{
    let total = workflow.testcases.len();
    debug!(
        "Running suite {} ({}) with {} testcases",
        workflow.suite, workflow.revision, total
    );

    let mut done = 0;
    for (idx, testcase) in workflow.testcases.iter().enumerate() {
        let start = Instant::now();
        client.declare_testcase(&workflow.suite, &workflow.revision, testcase)?;
        callback(testcase, &mut *client)?;
        client.post()?;
        done += 1;
        info!(
            "{:>4}. <green>SENT</> {} <dimmed>({} ms)</>",
            idx + 1,
            testcase,
            start.elapsed().as_millis()
        );
    }

    info!("Processed {} of {} testcases", done, total);
    Ok(done)
}
