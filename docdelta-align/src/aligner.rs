use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::RangeInclusive;

use docdelta::{Side, StructuralUnit};

use crate::similarity::{similarity, UnitFeatures};
use crate::{AlignerConfig, Alignment, AlignmentStats, Correspondence, CorrespondenceKind};

/// Aligns the units of a reference and a client document.
#[derive(Debug, Clone, Default)]
pub struct StructuralAligner {
    config: AlignerConfig,
}

/// A scored reference/client pair waiting for greedy acceptance.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    reference: usize,
    client: usize,
    score: f64,
    distance: usize,
}

impl Candidate {
    /// Best score first, then smaller ordinal distance, then smaller ids.
    fn priority(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.distance.cmp(&other.distance))
            .then(self.reference.cmp(&other.reference))
            .then(self.client.cmp(&other.client))
    }
}

/// Which units are already part of a correspondence.
struct Claims {
    reference: Vec<bool>,
    client: Vec<bool>,
}

impl Claims {
    fn new(reference: usize, client: usize) -> Self {
        Self {
            reference: vec![false; reference],
            client: vec![false; client],
        }
    }

    fn is_claimed(&self, side: Side, ordinal: usize) -> bool {
        let slots = match side {
            Side::Reference => &self.reference,
            Side::Client => &self.client,
        };
        slots.get(ordinal).copied().unwrap_or(true)
    }

    fn claim(&mut self, corr: &Correspondence) {
        for &r in &corr.reference {
            self.reference[r] = true;
        }
        for &c in &corr.client {
            self.client[c] = true;
        }
    }

    fn len(&self, side: Side) -> usize {
        match side {
            Side::Reference => self.reference.len(),
            Side::Client => self.client.len(),
        }
    }
}

/// Memoized pair scoring over precomputed features.
struct Scorer<'a> {
    reference: &'a [UnitFeatures],
    client: &'a [UnitFeatures],
    config: &'a AlignerConfig,
    cache: HashMap<(usize, usize), f64>,
    comparisons: usize,
}

impl<'a> Scorer<'a> {
    fn pair(&mut self, reference: usize, client: usize) -> f64 {
        if let Some(&score) = self.cache.get(&(reference, client)) {
            return score;
        }
        let score = similarity(&self.reference[reference], &self.client[client], self.config);
        self.comparisons += 1;
        self.cache.insert((reference, client), score);
        score
    }

    /// Score of `one` against a single unit of the run side.
    fn part(&mut self, run_side: Side, one: usize, other: usize) -> f64 {
        match run_side {
            Side::Client => self.pair(one, other),
            Side::Reference => self.pair(other, one),
        }
    }

    /// Score of `one` against a run of adjacent units read as one text.
    fn run(&mut self, run_side: Side, one: usize, run: RangeInclusive<usize>) -> f64 {
        self.comparisons += 1;
        let size = self.config.shingle_size;
        match run_side {
            Side::Client => {
                let joined = UnitFeatures::concat(&self.client[run], size);
                similarity(&self.reference[one], &joined, self.config)
            }
            Side::Reference => {
                let joined = UnitFeatures::concat(&self.reference[run], size);
                similarity(&joined, &self.client[one], self.config)
            }
        }
    }
}

impl StructuralAligner {
    /// Create a new aligner with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aligner with custom configuration.
    pub fn with_config(config: AlignerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Partition both unit sequences into correspondences.
    pub fn align(&self, reference: &[StructuralUnit], client: &[StructuralUnit]) -> Alignment {
        let size = self.config.shingle_size;
        let reference_features: Vec<_> = reference
            .iter()
            .map(|u| UnitFeatures::of_unit(u, size))
            .collect();
        let client_features: Vec<_> = client
            .iter()
            .map(|u| UnitFeatures::of_unit(u, size))
            .collect();

        let mut scorer = Scorer {
            reference: &reference_features,
            client: &client_features,
            config: &self.config,
            cache: HashMap::new(),
            comparisons: 0,
        };
        let mut claims = Claims::new(reference.len(), client.len());
        let mut correspondences = Vec::new();
        let mut stats = AlignmentStats {
            reference_units: reference.len(),
            client_units: client.len(),
            ..Default::default()
        };

        // Pass 1: identical normalized text
        let anchors = anchor_identical(reference, client);
        for &(r, c) in &anchors {
            let corr = Correspondence::matched(r, c, 1.0);
            claims.claim(&corr);
            correspondences.push(corr);
        }
        stats.anchors = anchors.len();

        // Pass 2: scored candidates near projected positions
        let mut candidates = self.collect_candidates(&anchors, &claims, &mut scorer);
        candidates.sort_by(Candidate::priority);

        // Pass 3: greedy acceptance, preferring split/merge over weak 1:1 matches
        for candidate in candidates {
            if claims.is_claimed(Side::Reference, candidate.reference)
                || claims.is_claimed(Side::Client, candidate.client)
            {
                continue;
            }

            let accepted = if candidate.score >= self.config.strong_match {
                Some(Correspondence::matched(
                    candidate.reference,
                    candidate.client,
                    candidate.score,
                ))
            } else {
                self.split_or_merge(&candidate, &claims, &mut scorer)
                    .or_else(|| {
                        (candidate.score >= self.config.match_threshold).then(|| {
                            Correspondence::matched(
                                candidate.reference,
                                candidate.client,
                                candidate.score,
                            )
                        })
                    })
            };

            if let Some(corr) = accepted {
                claims.claim(&corr);
                correspondences.push(corr);
            }
        }

        // Pass 4: leftovers
        for r in 0..reference.len() {
            if !claims.is_claimed(Side::Reference, r) {
                correspondences.push(Correspondence::deleted(r));
            }
        }
        for c in 0..client.len() {
            if !claims.is_claimed(Side::Client, c) {
                correspondences.push(Correspondence::inserted(c));
            }
        }

        correspondences.sort_by_key(|corr| {
            (
                corr.reference.first().copied().unwrap_or(usize::MAX),
                corr.client.first().copied().unwrap_or(usize::MAX),
            )
        });
        for corr in &correspondences {
            stats.increment(corr.kind);
        }
        stats.comparisons = scorer.comparisons;

        Alignment {
            correspondences,
            stats,
        }
    }

    fn collect_candidates(
        &self,
        anchors: &[(usize, usize)],
        claims: &Claims,
        scorer: &mut Scorer<'_>,
    ) -> Vec<Candidate> {
        let floor = self
            .config
            .split_merge_part_min
            .min(self.config.match_threshold);
        let client_len = claims.len(Side::Client);
        let mut candidates = Vec::new();

        for r in 0..claims.len(Side::Reference) {
            if claims.is_claimed(Side::Reference, r) {
                continue;
            }
            for c in self.search_range(r, anchors, client_len) {
                if claims.is_claimed(Side::Client, c) {
                    continue;
                }
                let score = scorer.pair(r, c);
                if score >= floor {
                    candidates.push(Candidate {
                        reference: r,
                        client: c,
                        score,
                        distance: r.abs_diff(c),
                    });
                }
            }
        }

        candidates
    }

    /// Client ordinals worth comparing against reference unit `r`.
    ///
    /// Near an anchor: a window around the position projected from the closest anchor.
    /// Otherwise: every client unit between the surrounding anchors.
    fn search_range(
        &self,
        r: usize,
        anchors: &[(usize, usize)],
        client_len: usize,
    ) -> std::ops::Range<usize> {
        if client_len == 0 {
            return 0..0;
        }
        let window = self.config.window;
        let split = anchors.partition_point(|&(ar, _)| ar < r);
        let prev = split.checked_sub(1).map(|i| anchors[i]);
        let next = anchors.get(split).copied();

        let closest = match (prev, next) {
            (Some(p), Some(n)) if r - p.0 <= n.0 - r => Some(p),
            (Some(_), Some(n)) => Some(n),
            (Some(p), None) => Some(p),
            (None, next) => next,
        };

        if let Some((ar, ac)) = closest.filter(|&(ar, _)| ar.abs_diff(r) <= window) {
            let projected = (ac + r).saturating_sub(ar).min(client_len - 1);
            let lo = projected.saturating_sub(window);
            let hi = (projected + window + 1).min(client_len);
            return lo..hi;
        }

        match (prev, next) {
            (Some(p), Some(n)) if p.1 < n.1 => p.1 + 1..n.1,
            (Some(p), None) => (p.1 + 1).min(client_len)..client_len,
            (None, Some(n)) => 0..n.1,
            _ => 0..client_len,
        }
    }

    /// Look for a split (one reference, adjacent client run) or merge (adjacent reference
    /// run, one client) seeded by a weak candidate that scores better than the pair alone.
    fn split_or_merge(
        &self,
        candidate: &Candidate,
        claims: &Claims,
        scorer: &mut Scorer<'_>,
    ) -> Option<Correspondence> {
        let split_run = self.grow_run(
            Side::Client,
            candidate.reference,
            candidate.client,
            candidate.score,
            claims,
            scorer,
        );
        let merge_run = self.grow_run(
            Side::Reference,
            candidate.client,
            candidate.reference,
            candidate.score,
            claims,
            scorer,
        );

        let split = |(run, score): (Vec<usize>, f64)| Correspondence {
            kind: CorrespondenceKind::Split,
            reference: vec![candidate.reference],
            client: run,
            similarity: score,
        };
        let merged = |(run, score): (Vec<usize>, f64)| Correspondence {
            kind: CorrespondenceKind::Merged,
            reference: run,
            client: vec![candidate.client],
            similarity: score,
        };

        match (split_run, merge_run) {
            (Some(s), Some(m)) if s.1 >= m.1 => Some(split(s)),
            (Some(s), None) => Some(split(s)),
            (_, Some(m)) => Some(merged(m)),
            (None, None) => None,
        }
    }

    /// Extend a run of adjacent unclaimed units on `run_side` around `seed` while the
    /// combined score against `one` improves.
    fn grow_run(
        &self,
        run_side: Side,
        one: usize,
        seed: usize,
        base: f64,
        claims: &Claims,
        scorer: &mut Scorer<'_>,
    ) -> Option<(Vec<usize>, f64)> {
        let len = claims.len(run_side);
        let (mut lo, mut hi) = (seed, seed);
        let mut current = base;

        while hi - lo + 1 < self.config.split_merge_max_parts {
            let options = [
                lo.checked_sub(1).map(|added| (added, hi, added)),
                (hi + 1 < len).then(|| (lo, hi + 1, hi + 1)),
            ];

            let mut best: Option<(usize, usize, f64)> = None;
            for (new_lo, new_hi, added) in options.into_iter().flatten() {
                if claims.is_claimed(run_side, added)
                    || scorer.part(run_side, one, added) < self.config.split_merge_part_min
                {
                    continue;
                }
                let score = scorer.run(run_side, one, new_lo..=new_hi);
                if score > current && best.map_or(true, |(_, _, s)| score > s) {
                    best = Some((new_lo, new_hi, score));
                }
            }

            match best {
                Some((new_lo, new_hi, score)) => {
                    lo = new_lo;
                    hi = new_hi;
                    current = score;
                }
                None => break,
            }
        }

        (hi > lo && current >= self.config.split_merge_accept && current > base)
            .then(|| ((lo..=hi).collect(), current))
    }
}

/// Pair units with identical normalized text, nearest to the running offset first.
fn anchor_identical(
    reference: &[StructuralUnit],
    client: &[StructuralUnit],
) -> Vec<(usize, usize)> {
    let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for (c, unit) in client.iter().enumerate() {
        by_key.entry(unit.match_key()).or_default().push(c);
    }

    let mut anchors = Vec::new();
    let mut offset: isize = 0;
    for (r, unit) in reference.iter().enumerate() {
        let slots = match by_key.get_mut(&unit.match_key()) {
            Some(slots) if !slots.is_empty() => slots,
            _ => continue,
        };
        let projected = r as isize + offset;
        let nearest = slots
            .iter()
            .enumerate()
            .min_by_key(|&(_, &c)| ((c as isize - projected).abs(), c))
            .map(|(i, _)| i);
        if let Some(i) = nearest {
            let c = slots.remove(i);
            offset = c as isize - r as isize;
            anchors.push((r, c));
        }
    }
    anchors
}
