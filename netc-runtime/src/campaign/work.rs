use netc_core::TestProfile;

/// One (test_server, profile, target_server) attempt.
///
/// `index` is the item's position in the full work list, which is also the order of the
/// final report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkItem<'a> {
    pub index: usize,
    pub test_server: &'a str,
    pub target_server: &'a str,
    pub profile: &'a TestProfile,
}

impl std::fmt::Display for WorkItem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.test_server, self.target_server, self.profile.name
        )
    }
}

/// Every host as test server, every profile, every other host as target. Never a self-pair.
pub fn generate<'a>(hosts: &'a [String], profiles: &'a [TestProfile]) -> Vec<WorkItem<'a>> {
    let mut items = vec![];
    for test_server in hosts {
        for profile in profiles {
            for target_server in hosts.iter().filter(|h| *h != test_server) {
                items.push(WorkItem {
                    index: items.len(),
                    test_server,
                    target_server,
                    profile,
                });
            }
        }
    }
    items
}

/// Split the work list into lanes that may run concurrently.
///
/// A lane runs its items one at a time. With `parallel`, each test server gets its own lane so
/// no host ever runs two probes at once; otherwise everything shares one lane.
pub fn lanes(items: Vec<WorkItem<'_>>, parallel: bool) -> Vec<Vec<WorkItem<'_>>> {
    if !parallel {
        return vec![items];
    }

    let mut lanes: Vec<Vec<WorkItem<'_>>> = vec![];
    for item in items {
        match lanes
            .iter_mut()
            .find(|lane| lane[0].test_server == item.test_server)
        {
            Some(lane) => lane.push(item),
            None => lanes.push(vec![item]),
        }
    }
    lanes
}
