use crate::error::Segment;

/// Path accumulator threaded down the recursion as a borrowed chain, so
/// descending costs nothing and a `Vec` is only built for errors.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Trail<'a> {
    Root(&'a [Segment]),
    Key(&'a Trail<'a>, &'a str),
    Index(&'a Trail<'a>, usize),
}

impl<'a> Trail<'a> {
    pub(crate) fn key<'b>(&'b self, key: &'b str) -> Trail<'b> { Trail::Key(self, key) }

    pub(crate) fn index(&self, index: usize) -> Trail<'_> { Trail::Index(self, index) }

    pub(crate) fn depth(&self) -> usize {
        match self {
            Trail::Root(prefix) => prefix.len(),
            Trail::Key(parent, _) | Trail::Index(parent, _) => parent.depth() + 1,
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<Segment> {
        let mut out = Vec::with_capacity(self.depth());
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<Segment>) {
        match self {
            Trail::Root(prefix) => out.extend(prefix.iter().cloned()),
            Trail::Key(parent, key) => {
                parent.collect_into(out);
                out.push(Segment::Key(key.to_string()));
            }
            Trail::Index(parent, index) => {
                parent.collect_into(out);
                out.push(Segment::Index(*index));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realizes_prefix_then_steps() {
        let prefix = [Segment::from("req")];
        let root = Trail::Root(&prefix);
        let items = root.key("items");
        let second = items.index(1);
        assert_eq!(second.depth(), 3);
        assert_eq!(second.to_vec(), vec![Segment::from("req"), Segment::from("items"), Segment::from(1)]);
    }
}
