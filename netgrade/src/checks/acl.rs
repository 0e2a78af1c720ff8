use super::{Check, CheckContext, CheckResult, CheckScope, Shares};
use crate::normalize::ParsedDevice;

pub struct AclCheck;

impl Check for AclCheck {
    fn name(&self) -> &'static str {
        "acl"
    }

    fn applies_to(&self, master: &ParsedDevice, _scope: &CheckScope<'_>) -> bool {
        !master.config.acls.is_empty()
    }

    /// Entries are compared as multisets, so reordering a list is free. Each
    /// master entry and each interface binding is one share; entries the
    /// master list does not have cost a share each.
    fn evaluate(&self, ctx: &CheckContext<'_>) -> CheckResult {
        let master = &ctx.master.config;
        let student = &ctx.student.config;

        let entries: usize = master
            .acls
            .values()
            .flat_map(|list| list.entries.values())
            .sum();
        let bindings: usize = master
            .interfaces
            .values()
            .map(|iface| iface.access_groups.len())
            .sum();
        let mut shares = Shares::new(entries + bindings);

        for (id, expected) in &master.acls {
            let Some(found) = student.acls.get(id) else {
                shares.note(format!("access-list {id} not configured"));
                continue;
            };
            for (entry, &want) in &expected.entries {
                let have = found.entries.get(entry).copied().unwrap_or(0);
                shares.award(want.min(have) as f64);
                if have < want {
                    shares.fail(0.0, format!("access-list {id}: missing '{entry}'"));
                }
            }
            for (entry, &have) in &found.entries {
                let want = expected.entries.get(entry).copied().unwrap_or(0);
                if have > want {
                    shares.fail(
                        -((have - want) as f64),
                        format!("access-list {id}: unexpected '{entry}'"),
                    );
                }
            }
        }

        for (name, iface) in &master.interfaces {
            for group in &iface.access_groups {
                let bound = student
                    .interfaces
                    .get(name)
                    .is_some_and(|i| i.access_groups.contains(group));
                if bound {
                    shares.award(1.0);
                } else {
                    shares.fail(
                        0.0,
                        format!(
                            "{}: access-group {} {} missing",
                            name.short(),
                            group.acl,
                            group.direction
                        ),
                    );
                }
            }
        }

        for id in student.acls.keys().filter(|id| !master.acls.contains_key(*id)) {
            shares.note(format!("access-list {id} is not in the master configuration"));
        }

        shares.finish(self.name(), ctx.device)
    }
}
