pub mod compile_time {
    pub mod scan {
        /// Maximum snippet length accepted by the scanners (bytes)
        /// SECURITY: Bounds per-scan work for hostile upstream text
        pub const MAX_SNIPPET_LENGTH: usize = 4096;

        /// Maximum passes for outer-paren stripping
        /// TERMINATION: stripping is idempotent at its fixed point; five
        /// layers of fully-wrapping parens is already beyond observed input
        pub const MAX_PAREN_STRIP_PASSES: usize = 5;

        /// Maximum combined delimiter nesting depth tolerated by a scan
        /// SECURITY: Prevents pathological nesting from upstream sources
        pub const MAX_NESTING_DEPTH: u32 = 64;
    }

    pub mod rewrite {
        /// Maximum passes for expectation-factor removal
        /// TERMINATION: removing one factor can reveal at most one earlier
        /// occurrence per pass; real snippets carry one or two
        pub const MAX_EXPECTATION_PASSES: usize = 4;

        /// Inclusive range for the integer stack multiplier accepted by the
        /// additive-coefficient rule. Anything outside is a mistranslation
        /// signal and the rule must not fire.
        pub const MIN_STACK_MULTIPLIER: i64 = 1;
        pub const MAX_STACK_MULTIPLIER: i64 = 12;

        /// Call heads the additive-coefficient rule recognizes
        pub const DAMAGE_CALL_HEADS: &[&str] = &["dmg"];

        /// Ratio-conversion helper recognized inside increment factors
        pub const RATIO_CALL: &str = "toRatio";

        /// Accessor suffixes treated as near-synonymous damage reads; the
        /// first one is the canonical expected-value accessor
        pub const EXPECTED_VALUE_SUFFIX: &str = ".avg";
        pub const RAW_DAMAGE_SUFFIX: &str = ".dmg";

        /// The two lookups whose joint presence inside a multiplicative
        /// factor marks a crit-expectation double count
        pub const CRIT_CHANCE_READ: &str = "attr.cpct";
        pub const CRIT_DAMAGE_READ: &str = "attr.cdmg";

        /// Increment table labels must match the allow pattern and must not
        /// match the deny pattern for the additive rule to fire
        pub const INCREMENT_LABEL_ALLOW: &str = "(提升|加成|倍率|增加)";
        pub const INCREMENT_LABEL_DENY: &str = "(上限|最大|冷却|消耗)";
    }

    pub mod consts {
        /// Maximum resolver passes over the pending list
        /// TERMINATION: chains longer than this simply stay unresolved
        pub const MAX_RESOLVE_PASSES: usize = 4;

        /// Maximum declarations accepted from one document
        /// SECURITY: Bounds symbol-table growth per record
        pub const MAX_DECLARATIONS: usize = 256;

        /// Maximum length an expression may reach through inlining (bytes)
        /// SECURITY: Stops substitution blow-up before it allocates further
        pub const MAX_INLINED_LENGTH: usize = 16_384;
    }

    pub mod validate {
        /// Free-identifier names the downstream evaluator exposes. An
        /// expression referencing anything else is untrusted and never
        /// emitted. `params` and `attr` are the per-invocation context
        /// objects; `talent` is the per-level table accessor.
        pub const EVALUATOR_ALLOWLIST: &[&str] = &[
            "params",
            "attr",
            "talent",
            "weapon",
            "cons",
            "refine",
            "level",
            "calc",
            "dmg",
            "basic",
            "Math",
            "true",
            "false",
            "null",
            "undefined",
            "Infinity",
            "NaN",
        ];
    }

    pub mod template {
        /// Tolerance used to classify a placeholder as constant across rows
        pub const VALUE_EPSILON: f64 = 1e-9;

        /// Maximum placeholder index accepted in one template
        pub const MAX_PLACEHOLDERS: usize = 16;

        /// Maximum upgrade rows accepted per template
        pub const MAX_ROWS: usize = 32;

        /// Literal prefixes removed from a template core. These are verb or
        /// role-count lead-ins, not units, so they are dropped rather than
        /// reported.
        pub const DROP_PREFIXES: &[&str] = &["造成", "每层", "每个", "每名", "恢复", "附加"];

        /// Literal suffixes removed from a template core (stat-name tails)
        pub const DROP_SUFFIXES: &[&str] = &["点伤害", "的伤害", "点"];

        /// Literal suffixes reported in the `unit` field
        pub const UNIT_SUFFIXES: &[&str] = &["%", "秒", "层", "次", "格"];
    }

    pub mod pipeline {
        /// Maximum expressions conditioned per record
        pub const MAX_EXPRESSIONS: usize = 128;

        /// Maximum promote-row groups rendered per record
        pub const MAX_PROMOTE_GROUPS: usize = 32;
    }
}
