/// States a traceback can visit, in Plan7 terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceState {
    S,
    N,
    B,
    M,
    I,
    D,
    E,
    J,
    C,
    T,
}

impl TraceState {
    pub fn name(self) -> &'static str {
        match self {
            TraceState::S => "S",
            TraceState::N => "N",
            TraceState::B => "B",
            TraceState::M => "M",
            TraceState::I => "I",
            TraceState::D => "D",
            TraceState::E => "E",
            TraceState::J => "J",
            TraceState::C => "C",
            TraceState::T => "T",
        }
    }

    fn emits_on_transition(self) -> bool {
        matches!(self, TraceState::N | TraceState::J | TraceState::C)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceStep {
    pub state: TraceState,
    pub seq_idx: usize,
    pub prof_idx: usize,
}

/// An alignment path from S to T.
///
/// Built in reverse during traceback, then flipped into S -> T order by
/// [`Trace::finish`]. N/J/C record a sequence index only on the steps where
/// they emit (their self-loops), matching the deferred-decrement rule of
/// the traceback.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    pub steps: Vec<TraceStep>,
    pub first_m: Option<(usize, usize)>,
    pub last_m: Option<(usize, usize)>,
    pub target_length: usize,
    pub profile_length: usize,
}

impl Trace {
    pub fn new(target_length: usize, profile_length: usize) -> Self {
        Self {
            target_length,
            profile_length,
            ..Self::default()
        }
    }

    pub fn reuse(&mut self, target_length: usize, profile_length: usize) {
        self.steps.clear();
        self.first_m = None;
        self.last_m = None;
        self.target_length = target_length;
        self.profile_length = profile_length;
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append a state visited during (reverse-order) traceback.
    pub fn push(&mut self, state: TraceState, seq_idx: usize, prof_idx: usize) {
        let step = match state {
            TraceState::M | TraceState::I => TraceStep {
                state,
                seq_idx,
                prof_idx,
            },
            TraceState::D => TraceStep {
                state,
                seq_idx: 0,
                prof_idx,
            },
            s if s.emits_on_transition() => {
                // only the self-loop steps of N/J/C consume a residue
                let emitting = self.steps.last().map(|prev| prev.state) == Some(state);
                TraceStep {
                    state,
                    seq_idx: if emitting { seq_idx } else { 0 },
                    prof_idx: 0,
                }
            }
            _ => TraceStep {
                state,
                seq_idx: 0,
                prof_idx: 0,
            },
        };
        self.steps.push(step);
    }

    /// Flip the trace into S -> T order and record the match anchors.
    pub fn finish(&mut self) {
        // the first loop step of an N/J/C run holds no residue when built
        // backwards; shift the index so the run emits front-to-back
        for idx in 0..self.steps.len().saturating_sub(1) {
            let (a, b) = (self.steps[idx], self.steps[idx + 1]);
            if a.state == b.state && a.state.emits_on_transition() && a.seq_idx == 0 {
                self.steps[idx].seq_idx = b.seq_idx;
                self.steps[idx + 1].seq_idx = 0;
            }
        }

        self.steps.reverse();

        self.first_m = self
            .steps
            .iter()
            .find(|step| step.state == TraceState::M)
            .map(|step| (step.seq_idx, step.prof_idx));
        self.last_m = self
            .steps
            .iter()
            .rev()
            .find(|step| step.state == TraceState::M)
            .map(|step| (step.seq_idx, step.prof_idx));
    }

    /// MMseqs-style CIGAR over the core-model states (run-length + state).
    pub fn cigar(&self) -> String {
        let mut cigar = String::new();
        let mut run: Option<(TraceState, usize)> = None;

        for step in &self.steps {
            if !matches!(step.state, TraceState::M | TraceState::I | TraceState::D) {
                continue;
            }
            match run {
                Some((state, count)) if state == step.state => run = Some((state, count + 1)),
                Some((state, count)) => {
                    cigar.push_str(&format!("{count}{}", state.name()));
                    run = Some((step.state, 1));
                }
                None => run = Some((step.state, 1)),
            }
        }
        if let Some((state, count)) = run {
            cigar.push_str(&format!("{count}{}", state.name()));
        }
        cigar
    }
}
